//! Error types for model operations

use thiserror::Error;

/// Error types for model operations
///
/// None of these are fatal: the chainable model API logs them and leaves
/// the instance unchanged, while the `try_` variants return them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Field is immutable: {0}")]
    ImmutableField(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Name already in use: {0}")]
    NameCollision(String),

    #[error("Invalid field path: {0}")]
    InvalidPath(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
