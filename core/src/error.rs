//! Error types for backend-independent operations.
//!
//! Covers identifier validation, CREATE statement rewriting, and copy plan
//! loading and saving.

use thiserror::Error;

use crate::validate::ValidationError;

/// Errors that can occur in `sqlverb-core` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An identifier or plan failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A catalog CREATE statement whose table name could not be located.
    #[error("unrecognized CREATE TABLE statement: {0}")]
    UnrecognizedCreateStatement(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
