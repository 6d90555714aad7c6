//! Per-file bears.
//!
//! A local bear looks at one file at a time. The runner emits one task per
//! entry of the file dictionary, so files are analyzed in parallel.

use std::marker::PhantomData;
use std::sync::Arc;

use super::bear::{
    AnalysisContext, Bear, BearBinding, BearDefinition, BearHandle, BearKind, DependencyResults,
    ResultItem, Task, TaskInput,
};
use crate::error::{BearError, CoreError};
use crate::settings::{FileDict, Options, Section};

/// A bear that analyzes each file independently.
pub trait LocalBear<R: ResultItem>: BearDefinition<R> {
    fn analyze(
        &self,
        filename: &str,
        lines: &[String],
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
            LocalRunner::<Self, R>::construct,
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
        <Self as LocalBear<R>>::kind().instantiate(section, file_dict)
    }
}

/// Drives a [`LocalBear`] on behalf of the scheduler.
pub struct LocalRunner<B, R> {
    bear: B,
    binding: BearBinding,
    _results: PhantomData<fn() -> R>,
}

impl<B, R> LocalRunner<B, R>
where
    B: LocalBear<R>,
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

impl<B, R> Bear<R> for LocalRunner<B, R>
where
    B: LocalBear<R>,
    R: ResultItem,
{
    fn kind(&self) -> BearKind<R> {
        <B as LocalBear<R>>::kind()
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
        self.binding
            .file_dict
            .iter()
            .map(|(filename, lines)| Task {
                input: TaskInput::File {
                    filename: filename.to_string(),
                    lines: Arc::clone(lines),
                },
                options: Arc::clone(&self.binding.options),
                dependency_results: Arc::clone(&dependency_results),
            })
            .collect()
    }

    fn execute_task(&self, task: Task<R>) -> Result<Vec<R>, BearError> {
        match &task.input {
            TaskInput::File { filename, lines } => {
                let ctx = AnalysisContext::new(&self.binding, &task);
                self.bear.analyze(filename, lines, &ctx)
            }
            other => Err(format!("{} expects a file task, got {other:?}", B::name()).into()),
        }
    }
}
