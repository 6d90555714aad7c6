//! Error Types
//!
//! Errors surfaced by the execution core. Construction-time problems
//! (cycles, bad settings) are returned to the caller before anything is
//! scheduled. Task failures never escape a run: they are captured at the
//! completion site as [`TaskError`] and logged.

use std::fmt;

use thiserror::Error;

/// Error produced by a bear's analysis.
pub type BearError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error produced by a result sink.
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A directed cycle was found while walking a dependency graph.
///
/// `cycle` lists the nodes on the cycle, starting and ending with the node
/// that was re-entered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct CircularDependencyError {
    cycle: Vec<String>,
}

impl CircularDependencyError {
    pub(crate) fn new(cycle: Vec<String>) -> Self {
        Self { cycle }
    }

    /// The nodes forming the cycle.
    pub fn cycle(&self) -> &[String] {
        &self.cycle
    }
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circular dependency detected: {}", self.cycle.join(" -> "))
    }
}

/// Errors raised while setting up a run.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    CircularDependency(#[from] CircularDependencyError),

    #[error("bear `{bear}` requires setting `{setting}`, which section `{section}` does not provide")]
    MissingSetting {
        bear: String,
        section: String,
        setting: String,
    },

    #[error("setting `{setting}` of section `{section}` is not a valid {expected}: {value:?}")]
    InvalidSetting {
        section: String,
        setting: String,
        value: String,
        expected: &'static str,
    },

    #[error("failed to start the task executor")]
    ExecutorStartup(#[source] std::io::Error),

    #[error("`run` cannot be called from inside an async runtime; await `Session::run` instead")]
    NestedRuntime,
}

/// Why a single task produced no results.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("bear `{bear}` failed")]
    Failed {
        bear: String,
        #[source]
        source: BearError,
    },

    #[error("bear `{bear}` panicked while executing a task")]
    Panicked { bear: String },

    #[error("task of bear `{bear}` was cancelled before completion")]
    Cancelled { bear: String },
}

/// Render an error together with its `source()` chain on one line.
pub(crate) fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
