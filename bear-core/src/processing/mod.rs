//! Processing
//!
//! Everything needed to execute a run: dependency initialization, the
//! session scheduler and the executors tasks are dispatched to.

mod executor;
mod initializer;
mod session;

pub use executor::{Executor, InlineExecutor, Job, PoolExecutor, TaskHandle};
pub use initializer::initialize_dependencies;
pub use session::{run, ResultSink, Session, TaskId};
