//! Session Scheduler
//!
//! A session drives one run: it submits the tasks of every bear whose
//! dependencies are satisfied, collects finished tasks, routes their results
//! to dependants and to the sink, and unlocks the next wave of bears.
//!
//! # How It Works
//!
//! 1. The initializer expands the supplied bears and returns the tracker
//!    plus the entrypoints (bears that wait on nothing).
//!
//! 2. `schedule` asks each ready bear for its tasks exactly once and submits
//!    them to the executor. A bear without tasks is resolved immediately.
//!
//! 3. When a task completes, `finish_task`:
//!    a. appends its results to the dependency buffers of the bear's dependants
//!    b. on failure, unschedules every transitive dependant
//!    c. resolves the bear once its last task is done and schedules the
//!       dependants that became free
//!    d. hands the results to the sink
//!
//! 4. The run ends when no task is in flight.
//!
//! # Threading
//!
//! All scheduler state lives on the driver. Workers only see the task they
//! run plus a frozen snapshot of the bear's dependency results, so nothing
//! here needs a lock.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::runtime::{Builder, Handle};
use tracing::{debug, error, warn};

use super::executor::{Executor, Job, PoolExecutor};
use super::initializer::initialize_dependencies;
use crate::bears::{BearHandle, BearId, DependencyResults, ResultItem};
use crate::config::ExecutorConfig;
use crate::error::{error_chain, CoreError, SinkError, TaskError};
use crate::graph::DependencyTracker;

/// Receives every result item of a run.
///
/// Errors are logged and otherwise ignored; they never stop the run.
pub trait ResultSink<R> {
    fn on_result(&mut self, result: R) -> Result<(), SinkError>;
}

impl<R, F> ResultSink<R> for F
where
    F: FnMut(R) -> Result<(), SinkError>,
{
    fn on_result(&mut self, result: R) -> Result<(), SinkError> {
        self(result)
    }
}

/// Identifier of a submitted task, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

type Completion<R> = BoxFuture<'static, (BearHandle<R>, TaskId, Result<Vec<R>, TaskError>)>;

/// Per-run scheduler state.
pub struct Session<R, S>
where
    R: ResultItem,
    S: ResultSink<R>,
{
    bears: Vec<BearHandle<R>>,
    entrypoints: Vec<BearHandle<R>>,
    tracker: DependencyTracker<BearHandle<R>>,
    executor: Arc<dyn Executor<R>>,
    sink: S,

    /// Unfinished tasks per bear.
    running_tasks: HashMap<BearHandle<R>, HashSet<TaskId>>,

    /// Results delivered so far to bears that have not been scheduled yet.
    dependency_results: HashMap<BearId, DependencyResults<R>>,

    /// Bears whose tasks have been generated.
    scheduled: HashSet<BearId>,

    in_flight: FuturesUnordered<Completion<R>>,
    next_task: u64,
}

impl<R, S> Session<R, S>
where
    R: ResultItem,
    S: ResultSink<R>,
{
    /// Prepare a run of `bears`.
    ///
    /// Dependencies are resolved here, so a circular dependency or a bad
    /// setting of a constructed dependency fails before anything is
    /// submitted.
    pub fn new<I>(bears: I, sink: S, executor: Arc<dyn Executor<R>>) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = BearHandle<R>>,
    {
        let bears: Vec<BearHandle<R>> = bears.into_iter().collect();
        let (tracker, entrypoints) = initialize_dependencies(bears.iter().cloned())?;

        debug!(
            bears = bears.len(),
            entrypoints = entrypoints.len(),
            edges = tracker.len(),
            "initialized session"
        );

        Ok(Self {
            bears,
            entrypoints,
            tracker,
            executor,
            sink,
            running_tasks: HashMap::new(),
            dependency_results: HashMap::new(),
            scheduled: HashSet::new(),
            in_flight: FuturesUnordered::new(),
            next_task: 0,
        })
    }

    /// The bears supplied by the caller.
    pub fn bears(&self) -> &[BearHandle<R>] {
        &self.bears
    }

    /// Bears that will be scheduled first.
    pub fn entrypoints(&self) -> &[BearHandle<R>] {
        &self.entrypoints
    }

    pub fn tracker(&self) -> &DependencyTracker<BearHandle<R>> {
        &self.tracker
    }

    /// Drive the run to completion.
    ///
    /// The executor is shut down when this returns, even if it unwinds.
    pub async fn run(mut self) {
        let _shutdown = ShutdownGuard(Arc::clone(&self.executor));

        let entrypoints = std::mem::take(&mut self.entrypoints);
        self.schedule(entrypoints);

        while let Some((bear, task, outcome)) = self.in_flight.next().await {
            self.finish_task(bear, task, outcome);
        }

        if self.tracker.are_dependencies_resolved() {
            debug!(bears = self.scheduled.len(), "session finished");
        } else {
            let pending: Vec<String> = self
                .tracker
                .dependants()
                .map(|bear| format!("{bear:?}"))
                .collect();
            warn!(
                pending = ?pending,
                "session finished with unresolved dependencies; these bears never ran"
            );
        }
    }

    fn next_task_id(&mut self) -> TaskId {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        id
    }

    /// Generate and submit the tasks of `bears`.
    fn schedule<I>(&mut self, bears: I)
    where
        I: IntoIterator<Item = BearHandle<R>>,
    {
        let mut without_tasks = Vec::new();

        for bear in bears {
            if !self.scheduled.insert(bear.id()) {
                warn!(bear = ?bear, "bear was already scheduled in this run; ignoring");
                continue;
            }

            let buffer = Arc::new(self.dependency_results.remove(&bear.id()).unwrap_or_default());
            let tasks = bear.generate_tasks(buffer);

            if tasks.is_empty() {
                debug!(bear = ?bear, "bear generated no tasks");
                without_tasks.push(bear);
                continue;
            }

            debug!(bear = ?bear, tasks = tasks.len(), "scheduling bear");

            let mut ids = HashSet::with_capacity(tasks.len());
            for task in tasks {
                let id = self.next_task_id();
                ids.insert(id);

                let worker = bear.clone();
                let handle = self
                    .executor
                    .submit(Job::new(bear.name(), move || worker.execute_task(task)));

                let owner = bear.clone();
                self.in_flight
                    .push(handle.map(move |outcome| (owner, id, outcome)).boxed());
            }
            self.running_tasks.insert(bear, ids);
        }

        for bear in without_tasks {
            self.cleanup(&bear);
        }
    }

    fn finish_task(
        &mut self,
        bear: BearHandle<R>,
        task: TaskId,
        outcome: Result<Vec<R>, TaskError>,
    ) {
        let results = match outcome {
            Ok(results) => {
                for dependant in self.tracker.get_dependants(&bear) {
                    self.dependency_results
                        .entry(dependant.id())
                        .or_default()
                        .extend(&bear, results.iter().cloned());
                }
                Some(results)
            }
            Err(failure) => {
                error!(bear = ?bear, error = %error_chain(&failure), "task failed");
                self.unschedule_dependants(&bear);
                None
            }
        };

        if let Some(running) = self.running_tasks.get_mut(&bear) {
            running.remove(&task);
        }
        self.cleanup(&bear);

        for result in results.into_iter().flatten() {
            self.dispatch(result);
        }
    }

    /// Drop every transitive dependant of a failed bear from the graph so it
    /// is never scheduled and does not hold up termination.
    fn unschedule_dependants(&mut self, bear: &BearHandle<R>) {
        let dependants = match self.tracker.get_all_dependants(bear) {
            Ok(dependants) => dependants,
            Err(cycle) => {
                warn!(bear = ?bear, error = %cycle, "could not collect dependants of failed bear");
                return;
            }
        };

        for dependant in dependants {
            debug!(bear = ?dependant, failed = ?bear, "unscheduling dependant of failed bear");
            self.tracker.resolve(&dependant);
            self.dependency_results.remove(&dependant.id());
        }
    }

    /// Resolve `bear` once its last task finished and schedule whatever
    /// that frees.
    fn cleanup(&mut self, bear: &BearHandle<R>) {
        let idle = self.running_tasks.get(bear).map_or(true, HashSet::is_empty);
        if !idle {
            return;
        }

        self.running_tasks.remove(bear);
        let freed = self.tracker.resolve(bear);
        if !freed.is_empty() {
            debug!(bear = ?bear, freed = freed.len(), "resolved bear");
            self.schedule(freed);
        }
    }

    fn dispatch(&mut self, result: R) {
        let sink = &mut self.sink;
        match panic::catch_unwind(AssertUnwindSafe(|| sink.on_result(result))) {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => {
                error!(error = %error_chain(&*failure), "result sink failed; continuing");
            }
            Err(_) => error!("result sink panicked; continuing"),
        }
    }
}

impl<R, S> fmt::Debug for Session<R, S>
where
    R: ResultItem,
    S: ResultSink<R>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("bears", &self.bears)
            .field("entrypoints", &self.entrypoints)
            .field("tracker", &self.tracker)
            .field("running_tasks", &self.running_tasks)
            .finish_non_exhaustive()
    }
}

/// Shuts the executor down when dropped.
struct ShutdownGuard<R>(Arc<dyn Executor<R>>);

impl<R> Drop for ShutdownGuard<R> {
    fn drop(&mut self) {
        self.0.shutdown();
    }
}

/// Run `bears` to completion, streaming every result to `sink`.
///
/// Without an `executor` a [`PoolExecutor`] with default settings is used.
/// The executor is shut down before this returns, whatever the outcome.
/// Only setup problems are returned as errors; failing tasks and sink
/// errors are logged.
///
/// The session is driven on a private runtime, so this must not be called
/// from async code. Inside a runtime it returns [`CoreError::NestedRuntime`]
/// without touching `bears` or `executor`; build a [`Session`] and await
/// [`Session::run`] there instead.
pub fn run<R, S, I>(
    bears: I,
    sink: S,
    executor: Option<Arc<dyn Executor<R>>>,
) -> Result<(), CoreError>
where
    R: ResultItem,
    S: ResultSink<R>,
    I: IntoIterator<Item = BearHandle<R>>,
{
    if Handle::try_current().is_ok() {
        return Err(CoreError::NestedRuntime);
    }

    let executor: Arc<dyn Executor<R>> = match executor {
        Some(executor) => executor,
        None => Arc::new(PoolExecutor::new(&ExecutorConfig::default())?),
    };
    let _shutdown = ShutdownGuard(Arc::clone(&executor));

    let session = Session::new(bears, sink, executor)?;

    let driver = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CoreError::ExecutorStartup)?;
    driver.block_on(session.run());

    Ok(())
}
