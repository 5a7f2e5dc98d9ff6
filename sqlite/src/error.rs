//! Error types for SQLite helper and table copy operations.
//!
//! Client faults from rusqlite propagate unchanged inside
//! [`SqliteError::DatabaseError`]; the only error this crate raises on its
//! own is a row-count mismatch under a failing mismatch policy.

use thiserror::Error;

/// Errors that can occur during SQLite operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Identifier validation or statement rewrite failure.
    #[error(transparent)]
    Core(#[from] sqlverb_core::CoreError),

    /// An insert did not affect exactly one row and the copy was set to fail.
    #[error("insert into {table} affected {affected} rows for source row {row}, expected 1")]
    RowCountMismatch {
        table: String,
        row: usize,
        affected: usize,
    },
}

impl From<sqlverb_core::ValidationError> for SqliteError {
    fn from(err: sqlverb_core::ValidationError) -> Self {
        SqliteError::Core(err.into())
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
