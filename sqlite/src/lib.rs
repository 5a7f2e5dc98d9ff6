//! SQL verb helpers and a table replicator for SQLite connections.
//!
//! This crate extends [`rusqlite::Connection`] with helpers named after
//! the SQL verb they issue, and copies tables (schema and rows) between
//! connections or within one connection.
//!
//! # Architecture
//!
//! - **`ext`** — [`ConnectionExt`]: insert, insert-or-replace, delete,
//!   execute, query and catalog lookups
//! - **`replicate`** — [`replicate_table`]: the schema-and-data copy
//! - **`convert`** — value rendering for literal inserts and JSON output
//!
//! Backend-independent pieces (options, reports, SQL text builders, copy
//! plans) live in `sqlverb-core` and are re-exported here.
//!
//! # Quick start
//!
//! ```
//! use rusqlite::Connection;
//! use sqlverb_sqlite::{ConnectionExt, CopyOptions, InsertVerb};
//!
//! let source = Connection::open_in_memory().unwrap();
//! source
//!     .execute_batch(
//!         "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
//!          INSERT INTO users VALUES (1, 'ann'), (2, 'bob');",
//!     )
//!     .unwrap();
//!
//! let backup = Connection::open_in_memory().unwrap();
//! let options = CopyOptions::new()
//!     .create_schema()
//!     .clear_destination()
//!     .with_insert_verb(InsertVerb::InsertOrReplace);
//!
//! let outcome = source.copy_table_to("users", &backup, &options).unwrap();
//! assert!(outcome.is_success());
//! assert_eq!(backup.count_rows("users").unwrap(), 2);
//! ```

mod convert;
mod error;
mod ext;
mod replicate;

pub use error::{Result, SqliteError};
pub use ext::{ConnectionExt, ResultSet};
pub use replicate::replicate_table;
pub use sqlverb_core::{
    CopyOptions, CopyOutcome, CopyReport, InsertVerb, MismatchPolicy, RowMismatch, ValueMode,
};
