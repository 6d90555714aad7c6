//! Settings
//!
//! The inputs a bear is bound to: the [`Section`] it is configured by, the
//! [`FileDict`] it analyzes, and the typed [`Options`] resolved from the
//! section through the bear's [`FunctionMetadata`].

mod file_dict;
mod options;
mod section;

pub use file_dict::FileDict;
pub use options::{FunctionMetadata, OptionKind, OptionSpec, OptionValue, Options};
pub use section::Section;
