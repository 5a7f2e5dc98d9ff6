//! Identifier and copy plan validation.
//!
//! Identifiers end up inside SQL text (always double-quoted), so they are
//! checked for the few things quoting cannot fix: emptiness, NUL bytes and
//! absurd lengths. Plans are checked for structural problems before any
//! database is opened.
//!
//! # Examples
//!
//! ```
//! use sqlverb_core::*;
//!
//! assert!(validate_identifier("users").is_ok());
//! assert_eq!(validate_identifier(""), Err(ValidationError::EmptyIdentifier));
//! ```

use thiserror::Error;

use crate::plan::{CopyPlan, PLAN_FORMAT_VERSION};
use crate::sql::identifiers_equal;

/// Longest identifier accepted, in bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Identifier and plan validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Identifier is empty.
    #[error("identifier cannot be empty")]
    EmptyIdentifier,
    /// Identifier contains a NUL byte.
    #[error("identifier contains a NUL byte: {0:?}")]
    IdentifierContainsNul(String),
    /// Identifier exceeds [`MAX_IDENTIFIER_LENGTH`].
    #[error("identifier exceeds {MAX_IDENTIFIER_LENGTH} bytes (got {len}): {name:?}")]
    IdentifierTooLong { name: String, len: usize },
    /// Plan version string is empty.
    #[error("plan version cannot be empty")]
    EmptyPlanVersion,
    /// Plan version is not one this crate understands.
    #[error("unsupported plan version: {0}")]
    UnsupportedPlanVersion(String),
    /// Plan lists no jobs.
    #[error("plan has no jobs")]
    EmptyPlan,
    /// A job would copy a table onto itself.
    #[error("job copies table onto itself: {0}")]
    SelfCopyJob(String),
}

/// Validates a table or column name.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    if name.contains('\0') {
        return Err(ValidationError::IdentifierContainsNul(name.to_string()));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::IdentifierTooLong {
            name: name.to_string(),
            len: name.len(),
        });
    }
    Ok(())
}

/// Validates a copy plan.
///
/// Checks the version, that there is at least one job, every table name,
/// and that no job copies a table onto itself when source and destination
/// are the same database.
///
/// # Examples
///
/// ```
/// use sqlverb_core::*;
///
/// let plan = CopyPlan::from_yaml_str(
///     "version: \"1.0\"\nsource: a.db\njobs:\n  - table: t\n",
/// )
/// .unwrap();
/// assert_eq!(validate_plan(&plan), vec![ValidationError::SelfCopyJob("t".to_string())]);
/// ```
pub fn validate_plan(plan: &CopyPlan) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if plan.version.trim().is_empty() {
        errors.push(ValidationError::EmptyPlanVersion);
        return errors;
    }
    if plan.version != PLAN_FORMAT_VERSION {
        errors.push(ValidationError::UnsupportedPlanVersion(plan.version.clone()));
        return errors;
    }
    if plan.jobs.is_empty() {
        errors.push(ValidationError::EmptyPlan);
        return errors;
    }

    let same_database = plan.is_same_database();
    for job in &plan.jobs {
        let destination = job.options.resolve_destination_table(&job.table);
        for name in [job.table.as_str(), destination] {
            if let Err(err) = validate_identifier(name) {
                errors.push(err);
            }
        }
        if same_database && identifiers_equal(&job.table, destination) {
            errors.push(ValidationError::SelfCopyJob(job.table.clone()));
        }
    }

    errors
}
