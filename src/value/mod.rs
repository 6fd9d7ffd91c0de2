//! Value trees and the pure operations over them
//!
//! Every model field stores a `Value`: an owned dynamic tree of scalars,
//! lists and string-keyed maps. The operations here (recursive merge,
//! default resolution, dotted-path access) are used by every layer of
//! the model.

mod merge;
mod path;
mod tree;

pub use merge::{deep_merge, resolve_value};
pub use path::{get_by_path, set_by_path, split_path};
pub use tree::Value;
