//! Per-dependency-result bears.
//!
//! A dependency bear post-processes what its dependencies produced: the
//! runner emits one task for every result item in its dependency buffer,
//! paired with the instance that produced it.

use std::marker::PhantomData;
use std::sync::Arc;

use super::bear::{
    AnalysisContext, Bear, BearBinding, BearDefinition, BearHandle, BearKind, DependencyResults,
    ResultItem, Task, TaskInput,
};
use crate::error::{BearError, CoreError};
use crate::settings::{FileDict, Options, Section};

/// A bear that analyzes each upstream result item independently.
pub trait DependencyBear<R: ResultItem>: BearDefinition<R> {
    fn analyze(
        &self,
        dependency: &BearHandle<R>,
        result: &R,
        ctx: &AnalysisContext<'_, R>,
    ) -> Result<Vec<R>, BearError>;

    fn kind() -> BearKind<R>
    where
        Self: Sized,
    {
        BearKind::new::<Self>(
            <Self as BearDefinition<R>>::name(),
            <Self as BearDefinition<R>>::dependencies,
            <Self as BearDefinition<R>>::metadata,
            DependencyRunner::<Self, R>::construct,
        )
    }

    /// Bind a new instance to `section` and `file_dict`.
    fn instantiate(
        section: Arc<Section>,
        file_dict: Arc<FileDict>,
    ) -> Result<BearHandle<R>, CoreError>
    where
        Self: Sized,
    {
        <Self as DependencyBear<R>>::kind().instantiate(section, file_dict)
    }
}

/// Drives a [`DependencyBear`] on behalf of the scheduler.
pub struct DependencyRunner<B, R> {
    bear: B,
    binding: BearBinding,
    _results: PhantomData<fn() -> R>,
}

impl<B, R> DependencyRunner<B, R>
where
    B: DependencyBear<R>,
    R: ResultItem,
{
    fn construct(
        section: Arc<Section>,
        file_dict: Arc<FileDict>,
    ) -> Result<BearHandle<R>, CoreError> {
        let binding = BearBinding::resolve::<R, B>(section, file_dict)?;
        Ok(BearHandle::new(Self {
            bear: B::default(),
            binding,
            _results: PhantomData,
        }))
    }
}

impl<B, R> Bear<R> for DependencyRunner<B, R>
where
    B: DependencyBear<R>,
    R: ResultItem,
{
    fn kind(&self) -> BearKind<R> {
        <B as DependencyBear<R>>::kind()
    }

    fn section(&self) -> &Arc<Section> {
        &self.binding.section
    }

    fn file_dict(&self) -> &Arc<FileDict> {
        &self.binding.file_dict
    }

    fn options(&self) -> &Arc<Options> {
        &self.binding.options
    }

    fn generate_tasks(&self, dependency_results: Arc<DependencyResults<R>>) -> Vec<Task<R>> {
        let mut tasks = Vec::with_capacity(dependency_results.total());
        for (_, output) in dependency_results.iter() {
            for result in &output.results {
                tasks.push(Task {
                    input: TaskInput::DependencyResult {
                        dependency: output.bear.clone(),
                        result: result.clone(),
                    },
                    options: Arc::clone(&self.binding.options),
                    dependency_results: Arc::clone(&dependency_results),
                });
            }
        }
        tasks
    }

    fn execute_task(&self, task: Task<R>) -> Result<Vec<R>, BearError> {
        match &task.input {
            TaskInput::DependencyResult { dependency, result } => {
                let ctx = AnalysisContext::new(&self.binding, &task);
                self.bear.analyze(dependency, result, &ctx)
            }
            other => Err(format!(
                "{} expects a dependency result task, got {other:?}",
                B::name()
            )
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bears::LocalBear;

    #[derive(Default)]
    struct Upstream;

    impl BearDefinition<String> for Upstream {}

    impl LocalBear<String> for Upstream {
        fn analyze(
            &self,
            filename: &str,
            _: &[String],
            _: &AnalysisContext<'_, String>,
        ) -> Result<Vec<String>, BearError> {
            Ok(vec![format!("A:{filename}")])
        }
    }

    #[derive(Default)]
    struct Wrap;

    impl BearDefinition<String> for Wrap {
        fn dependencies() -> Vec<BearKind<String>> {
            vec![Upstream::kind()]
        }
    }

    impl DependencyBear<String> for Wrap {
        fn analyze(
            &self,
            dependency: &BearHandle<String>,
            result: &String,
            _: &AnalysisContext<'_, String>,
        ) -> Result<Vec<String>, BearError> {
            Ok(vec![format!("{}({result})", dependency.name())])
        }
    }

    #[test]
    fn one_task_per_dependency_result() {
        let section = Arc::new(Section::new("all"));
        let files = Arc::new(FileDict::new());
        let upstream = Upstream::instantiate(section.clone(), files.clone()).unwrap();
        let wrap = Wrap::instantiate(section, files).unwrap();

        let mut buffer = DependencyResults::new();
        buffer.extend(&upstream, ["A:f".to_string(), "A:g".to_string()]);

        let tasks = wrap.generate_tasks(Arc::new(buffer));
        assert_eq!(tasks.len(), 2);

        let results: Vec<String> = tasks
            .into_iter()
            .flat_map(|task| wrap.execute_task(task).unwrap())
            .collect();
        assert_eq!(results, ["Upstream(A:f)", "Upstream(A:g)"]);
    }

    #[test]
    fn no_results_means_no_tasks() {
        let wrap = Wrap::instantiate(Arc::new(Section::new("all")), Arc::default()).unwrap();
        assert!(wrap.generate_tasks(Arc::default()).is_empty());
    }
}
