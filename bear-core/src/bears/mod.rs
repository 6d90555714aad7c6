//! Bears
//!
//! Analysis units and the three standard ways of splitting their work into
//! tasks.
//!
//! # Writing a Bear
//!
//! 1. Define a `Default` type and implement [`BearDefinition`] for it to
//!    declare its dependencies and options.
//! 2. Implement exactly one variant trait:
//!    - [`GlobalBear`]: one task over the whole file dictionary
//!    - [`LocalBear`]: one task per file
//!    - [`DependencyBear`]: one task per result of each dependency
//! 3. Refer to the bear elsewhere through its kind (`MyBear::kind()`) and
//!    create instances with `MyBear::instantiate(section, file_dict)`.
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct LineCountBear;
//!
//! impl BearDefinition<String> for LineCountBear {}
//!
//! impl LocalBear<String> for LineCountBear {
//!     fn analyze(&self, filename: &str, lines: &[String], _: &AnalysisContext<'_, String>)
//!         -> Result<Vec<String>, BearError>
//!     {
//!         Ok(vec![format!("{filename}:{}", lines.len())])
//!     }
//! }
//! ```

mod bear;
mod dependency;
mod global;
mod local;

pub use bear::{
    AnalysisContext, Bear, BearBinding, BearDefinition, BearHandle, BearId, BearKind,
    DependencyOutput, DependencyResults, ResultItem, Task, TaskInput,
};
pub use dependency::{DependencyBear, DependencyRunner};
pub use global::{GlobalBear, GlobalRunner};
pub use local::{LocalBear, LocalRunner};
