//! Task Executors
//!
//! An executor runs jobs off the driver thread and hands back a
//! [`TaskHandle`] that resolves once the job is done. The session only ever
//! awaits handles; it never blocks on a worker.
//!
//! Two implementations ship with the crate:
//!
//! - [`PoolExecutor`]: a dedicated multi-threaded tokio runtime whose
//!   blocking pool runs the jobs. This is the default.
//! - [`InlineExecutor`]: runs each job on the submitting thread. Useful for
//!   deterministic debugging.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

use crate::config::ExecutorConfig;
use crate::error::{BearError, CoreError, TaskError};

/// A unit of work for an executor, labelled with the bear it belongs to.
pub struct Job<R> {
    bear: &'static str,
    work: Box<dyn FnOnce() -> Result<Vec<R>, BearError> + Send + 'static>,
}

impl<R> Job<R> {
    pub fn new<F>(bear: &'static str, work: F) -> Self
    where
        F: FnOnce() -> Result<Vec<R>, BearError> + Send + 'static,
    {
        Self {
            bear,
            work: Box::new(work),
        }
    }

    /// Name of the bear the job runs for.
    pub fn bear(&self) -> &'static str {
        self.bear
    }

    /// Run the job on the current thread.
    pub fn execute(self) -> Result<Vec<R>, TaskError> {
        let bear = self.bear;
        (self.work)().map_err(|source| TaskError::Failed {
            bear: bear.to_string(),
            source,
        })
    }
}

/// Completion handle of a submitted job.
pub struct TaskHandle<R> {
    inner: BoxFuture<'static, Result<Vec<R>, TaskError>>,
}

impl<R> TaskHandle<R> {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<Vec<R>, TaskError>> + Send + 'static,
    {
        Self { inner: future.boxed() }
    }

    /// A handle that is already complete.
    pub fn ready(outcome: Result<Vec<R>, TaskError>) -> Self
    where
        R: Send + 'static,
    {
        Self::new(future::ready(outcome))
    }
}

impl<R> Future for TaskHandle<R> {
    type Output = Result<Vec<R>, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

/// Runs jobs in parallel with the driver.
pub trait Executor<R>: Send + Sync {
    fn submit(&self, job: Job<R>) -> TaskHandle<R>;

    /// Release worker resources. Must be idempotent; jobs submitted
    /// afterwards resolve to [`TaskError::Cancelled`].
    fn shutdown(&self);
}

/// Thread-pool executor backed by a dedicated tokio runtime.
pub struct PoolExecutor {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    workers: usize,
}

impl PoolExecutor {
    pub fn new(config: &ExecutorConfig) -> Result<Self, CoreError> {
        let workers = config.workers();
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name(config.thread_name.clone())
            .build()
            .map_err(CoreError::ExecutorStartup)?;

        debug!(workers, "started pool executor");

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            workers,
        })
    }

    /// Maximum number of jobs running at once.
    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl<R> Executor<R> for PoolExecutor
where
    R: Send + 'static,
{
    fn submit(&self, job: Job<R>) -> TaskHandle<R> {
        let bear = job.bear();
        let join = self.handle.spawn_blocking(move || job.execute());

        TaskHandle::new(async move {
            match join.await {
                Ok(outcome) => outcome,
                Err(error) if error.is_panic() => Err(TaskError::Panicked {
                    bear: bear.to_string(),
                }),
                Err(_) => Err(TaskError::Cancelled {
                    bear: bear.to_string(),
                }),
            }
        })
    }

    fn shutdown(&self) {
        // shutdown_background never blocks, so this is safe to call from
        // inside the driver's async context.
        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_background();
            debug!("pool executor shut down");
        }
    }
}

impl Drop for PoolExecutor {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}

/// Runs every job to completion inside `submit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl<R> Executor<R> for InlineExecutor
where
    R: Send + 'static,
{
    fn submit(&self, job: Job<R>) -> TaskHandle<R> {
        let bear = job.bear();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.execute())).unwrap_or_else(|_| {
            Err(TaskError::Panicked {
                bear: bear.to_string(),
            })
        });
        TaskHandle::ready(outcome)
    }

    fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: Future>(future: F) -> F::Output {
        Builder::new_current_thread()
            .build()
            .expect("runtime")
            .block_on(future)
    }

    #[test]
    fn job_maps_bear_errors() {
        let job: Job<u32> = Job::new("FailingBear", || Err("boom".into()));

        match job.execute() {
            Err(TaskError::Failed { bear, source }) => {
                assert_eq!(bear, "FailingBear");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn pool_runs_jobs_on_worker_threads() {
        let config = ExecutorConfig {
            workers: Some(2),
            ..ExecutorConfig::default()
        };
        let executor = PoolExecutor::new(&config).unwrap();
        assert_eq!(executor.workers(), 2);

        let driver = std::thread::current().id();
        let handle = executor.submit(Job::new("ThreadBear", move || {
            Ok(vec![std::thread::current().id() != driver])
        }));

        assert_eq!(block_on(handle).unwrap(), [true]);
        Executor::<bool>::shutdown(&executor);
    }

    #[test]
    fn pool_reports_panics() {
        let executor = PoolExecutor::new(&ExecutorConfig::default()).unwrap();
        let handle: TaskHandle<u32> =
            executor.submit(Job::new("PanicBear", || panic!("worker exploded")));

        assert!(matches!(
            block_on(handle),
            Err(TaskError::Panicked { bear }) if bear == "PanicBear"
        ));
    }

    #[test]
    fn pool_shutdown_is_idempotent() {
        let executor = PoolExecutor::new(&ExecutorConfig::default()).unwrap();
        Executor::<u32>::shutdown(&executor);
        Executor::<u32>::shutdown(&executor);

        let handle: TaskHandle<u32> = executor.submit(Job::new("LateBear", || Ok(vec![1])));
        assert!(block_on(handle).is_err());
    }

    #[test]
    fn inline_executor_runs_immediately() {
        let handle = InlineExecutor.submit(Job::new("InlineBear", || Ok(vec![1, 2, 3])));
        assert_eq!(block_on(handle).unwrap(), [1, 2, 3]);

        let handle: TaskHandle<u32> =
            InlineExecutor.submit(Job::new("InlineBear", || panic!("inline")));
        assert!(matches!(block_on(handle), Err(TaskError::Panicked { .. })));
    }
}
