//! Reactive model instances
//!
//! Schema-driven live objects: field slots initialized from defaults and
//! construction data, governed reads and writes (immutable fields are
//! fixed, unknown fields rejected), computed fields, and change watchers.

mod computed;
mod error;
mod field;
mod instance;
mod schema;
mod watch;

pub use computed::{ComputedGetter, ComputedSetter, ComputedSpec};
pub use error::ModelError;
pub use instance::ReactiveModel;
pub use schema::ModelSchema;
pub use watch::{WatchHandler, WatchSpec};
