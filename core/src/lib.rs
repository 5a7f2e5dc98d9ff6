//! Backend-independent building blocks for SQL verb helpers and table copies.
//!
//! This crate holds everything the table replicator needs that does not
//! touch a live database:
//!
//! - [`CopyOptions`] — per-call configuration with documented defaults
//!   (destination table, [`InsertVerb`], schema/clear/transaction switches,
//!   [`ValueMode`] and [`MismatchPolicy`]).
//! - [`CopyReport`] and [`CopyOutcome`] — what a copy did, or why it was
//!   rejected.
//! - [`sql`] — textual builders for the SQLite statements a copy issues,
//!   including the CREATE TABLE rewrite used for schema copies.
//! - [`CopyPlan`] — YAML documents describing several copies at once.
//!
//! # Example
//!
//! ```
//! use sqlverb_core::{CopyOptions, InsertVerb, sql};
//!
//! let options = CopyOptions::new()
//!     .with_destination_table("users_backup")
//!     .with_insert_verb(InsertVerb::InsertOrReplace)
//!     .create_schema();
//!
//! assert_eq!(options.resolve_destination_table("users"), "users_backup");
//!
//! let ddl = sql::rewrite_create_table(
//!     "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
//!     "users_backup",
//! )
//! .unwrap();
//! assert_eq!(ddl, r#"CREATE TABLE "users_backup" (id INTEGER PRIMARY KEY, name TEXT)"#);
//! ```

mod error;
mod plan;
pub mod sql;
mod types;
mod validate;

pub use error::{CoreError, Result};
pub use plan::{CopyJob, CopyPlan, PLAN_FORMAT_VERSION, same_file};
pub use types::*;
pub use validate::{MAX_IDENTIFIER_LENGTH, ValidationError, validate_identifier, validate_plan};
