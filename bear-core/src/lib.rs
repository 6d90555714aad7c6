//! Bear Core
//!
//! This crate provides the execution core of the bear code-analysis
//! orchestrator. It implements:
//!
//! - Dependency graph traversal with cycle detection
//! - Per-(section, corpus) instantiation of bear dependencies
//! - Parallel task scheduling with a dependency-unlock cascade
//! - Result fan-out to dependants and to a caller-supplied sink
//!
//! Loading configuration, reading files and rendering results are left to
//! the caller: the core consumes ready-made [`Section`]s, [`FileDict`]s and
//! bear instances, and hands every result to a [`ResultSink`].
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: graph walker and dependency tracker
//! - `bears`: the bear contract and its three task-shaping variants
//! - `settings`: sections, file dictionaries and typed bear options
//! - `processing`: dependency initialization, the session scheduler and executors
//! - `results`: a general purpose result item
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bear_core::{run, LocalBear, Section, FileDict};
//!
//! let section = Arc::new(Section::new("python"));
//! let files: Arc<FileDict> = Arc::new([("a.py", vec!["x = 1\n"])].into_iter().collect());
//!
//! let bear = LineCountBear::instantiate(section, files)?;
//! run(vec![bear], |result: String| {
//!     println!("{result}");
//!     Ok(())
//! }, None)?;
//! ```

pub mod bears;
pub mod config;
pub mod error;
pub mod graph;
pub mod processing;
pub mod results;
pub mod settings;

pub use bears::{
    AnalysisContext, Bear, BearDefinition, BearHandle, BearId, BearKind, DependencyBear,
    DependencyResults, GlobalBear, LocalBear, ResultItem, Task, TaskInput,
};
pub use config::ExecutorConfig;
pub use error::{BearError, CircularDependencyError, CoreError, SinkError, TaskError};
pub use graph::{traverse_graph, DependencyTracker};
pub use processing::{
    initialize_dependencies, run, Executor, InlineExecutor, Job, PoolExecutor, ResultSink, Session,
    TaskHandle,
};
pub use results::{AnalysisResult, Severity, SourceRange};
pub use settings::{
    FileDict, FunctionMetadata, OptionKind, OptionSpec, OptionValue, Options, Section,
};
