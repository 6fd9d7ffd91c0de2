// Remodel - Reactive Data Modeling Runtime

pub mod model;
pub mod value;

pub use model::{ComputedSpec, ModelError, ModelSchema, ReactiveModel, WatchSpec};
pub use value::Value;
