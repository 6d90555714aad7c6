//! Whole-corpus bears.
//!
//! A global bear runs exactly once per instance, over the complete file
//! dictionary. Use it for analyses that need to see every file at once,
//! such as cross-file duplicate detection.

use std::marker::PhantomData;
use std::sync::Arc;

use super::bear::{
    AnalysisContext, Bear, BearBinding, BearDefinition, BearHandle, BearKind, DependencyResults,
    ResultItem, Task, TaskInput,
};
use crate::error::{BearError, CoreError};
use crate::settings::{FileDict, Options, Section};

/// A bear that analyzes the whole corpus in a single task.
pub trait GlobalBear<R: ResultItem>: BearDefinition<R> {
    fn analyze(&self, files: &FileDict, ctx: &AnalysisContext<'_, R>) -> Result<Vec<R>, BearError>;

    fn kind() -> BearKind<R>
    where
        Self: Sized,
    {
        BearKind::new::<Self>(
            <Self as BearDefinition<R>>::name(),
            <Self as BearDefinition<R>>::dependencies,
            <Self as BearDefinition<R>>::metadata,
            GlobalRunner::<Self, R>::construct,
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
        <Self as GlobalBear<R>>::kind().instantiate(section, file_dict)
    }
}

/// Drives a [`GlobalBear`] on behalf of the scheduler.
pub struct GlobalRunner<B, R> {
    bear: B,
    binding: BearBinding,
    _results: PhantomData<fn() -> R>,
}

impl<B, R> GlobalRunner<B, R>
where
    B: GlobalBear<R>,
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

impl<B, R> Bear<R> for GlobalRunner<B, R>
where
    B: GlobalBear<R>,
    R: ResultItem,
{
    fn kind(&self) -> BearKind<R> {
        <B as GlobalBear<R>>::kind()
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
        vec![Task {
            input: TaskInput::Corpus,
            options: Arc::clone(&self.binding.options),
            dependency_results,
        }]
    }

    fn execute_task(&self, task: Task<R>) -> Result<Vec<R>, BearError> {
        match task.input {
            TaskInput::Corpus => {
                let ctx = AnalysisContext::new(&self.binding, &task);
                self.bear.analyze(&self.binding.file_dict, &ctx)
            }
            other => Err(format!("{} expects a corpus task, got {other:?}", B::name()).into()),
        }
    }
}
