//! Schema-and-data table copies between SQLite connections.
//!
//! [`replicate_table`] optionally recreates the destination table from the
//! source catalog, optionally clears it, then streams every source row into
//! it with one insert per row. Reads and writes alternate strictly: one row
//! is read, one row is written.
//!
//! # Transactions
//!
//! With [`CopyOptions::use_transaction`] the whole copy runs in one
//! transaction on the destination connection and is committed once at the
//! end. Any error drops the transaction, which rolls back every write made
//! by the copy, schema changes included. If the destination connection is
//! already inside a caller-owned transaction, the copy joins it and leaves
//! commit or rollback to the caller.
//!
//! Without a transaction each statement auto-commits, so rows written
//! before an error stay in the destination.
//!
//! # Example
//!
//! ```
//! use rusqlite::Connection;
//! use sqlverb_core::CopyOptions;
//! use sqlverb_sqlite::{ConnectionExt, replicate_table};
//!
//! let source = Connection::open_in_memory().unwrap();
//! source
//!     .execute_batch(
//!         "CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);
//!          INSERT INTO T VALUES (1, 'a'), (2, 'b');",
//!     )
//!     .unwrap();
//! let destination = Connection::open_in_memory().unwrap();
//!
//! let options = CopyOptions::new().create_schema();
//! let outcome = replicate_table(&source, "T", Some(&destination), &options).unwrap();
//!
//! let report = outcome.report().unwrap();
//! assert_eq!(report.rows_read, 2);
//! assert!(report.schema_created);
//! assert_eq!(destination.count_rows("T").unwrap(), 2);
//!
//! // Same connection, same table: rejected without side effects.
//! let outcome = replicate_table(&source, "T", None, &CopyOptions::new()).unwrap();
//! assert!(!outcome.is_success());
//! ```

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, Transaction, params_from_iter};
use sqlverb_core::sql::{
    delete_all_sql, drop_table_if_exists_sql, identifiers_equal, insert_prefix, placeholders,
    quote_literal, rewrite_create_table, select_all_sql,
};
use sqlverb_core::{
    CopyOptions, CopyOutcome, CopyReport, MismatchPolicy, RowMismatch, ValueMode, same_file,
    validate_identifier,
};
use tracing::{debug, info, info_span, warn};

use crate::convert::value_to_text;
use crate::error::{Result, SqliteError};
use crate::ext::ConnectionExt;

/// Copies `source_table` from `source` into `destination`.
///
/// `destination` defaults to `source`; the destination table name defaults
/// to `source_table` (see [`CopyOptions::destination_table`]). Defaults are
/// resolved before anything runs.
///
/// Returns [`CopyOutcome::SelfCopy`] without touching either database when
/// both resolve to the same table in the same database. Two connections are
/// the same database when they are the same object or are opened on the
/// same file (see [`same_file`]). Table names are compared ASCII
/// case-insensitively.
///
/// # Errors
///
/// - [`SqliteError::Core`] for an invalid table name or a catalog CREATE
///   statement whose header cannot be rewritten.
/// - [`SqliteError::DatabaseError`] for any client fault, such as a key
///   conflict under [`InsertVerb::Insert`](sqlverb_core::InsertVerb::Insert)
///   or a destination table that does not exist.
/// - [`SqliteError::RowCountMismatch`] when an insert does not affect
///   exactly one row and the policy is [`MismatchPolicy::Fail`].
pub fn replicate_table(
    source: &Connection,
    source_table: &str,
    destination: Option<&Connection>,
    options: &CopyOptions,
) -> Result<CopyOutcome> {
    let destination = destination.unwrap_or(source);
    let destination_table = options.resolve_destination_table(source_table);
    validate_identifier(source_table)?;
    validate_identifier(destination_table)?;

    if identifiers_equal(source_table, destination_table) && same_database(source, destination) {
        warn!(
            table = source_table,
            "source and destination are the same table; nothing copied"
        );
        return Ok(CopyOutcome::SelfCopy);
    }

    let span = info_span!(
        "replicate_table",
        source = source_table,
        destination = destination_table
    );
    let _guard = span.enter();

    let copy = TableCopy {
        source,
        source_table,
        destination,
        destination_table,
        options,
    };
    copy.run().map(CopyOutcome::Copied)
}

fn same_database(a: &Connection, b: &Connection) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    match (database_file(a), database_file(b)) {
        (Some(a), Some(b)) => same_file(Path::new(a), Path::new(b)),
        _ => false,
    }
}

/// Path of the main database file; `None` for in-memory databases.
fn database_file(conn: &Connection) -> Option<&str> {
    conn.path().filter(|path| !path.is_empty())
}

/// One resolved copy.
struct TableCopy<'a> {
    source: &'a Connection,
    source_table: &'a str,
    destination: &'a Connection,
    destination_table: &'a str,
    options: &'a CopyOptions,
}

impl<'a> TableCopy<'a> {
    fn run(&self) -> Result<CopyReport> {
        let mut report = CopyReport::new(self.source_table, self.destination_table);
        let tx = self.begin()?;

        if self.options.create_schema_first {
            self.create_schema(&mut report)?;
        } else if self.options.clear_destination_first {
            let deleted = self
                .destination
                .execute(&delete_all_sql(self.destination_table), [])?;
            debug!(deleted, "cleared destination table");
            report.destination_cleared = true;
        }

        self.copy_rows(&mut report)?;

        if let Some(tx) = tx {
            tx.commit()?;
            debug!("committed copy transaction");
        }

        info!(
            rows_read = report.rows_read,
            rows_written = report.rows_written,
            mismatches = report.mismatches.len(),
            "table copy complete"
        );
        Ok(report)
    }

    fn begin(&self) -> Result<Option<Transaction<'a>>> {
        if !self.options.use_transaction {
            return Ok(None);
        }
        if !self.destination.is_autocommit() {
            debug!("destination already in a transaction; joining it");
            return Ok(None);
        }
        Ok(Some(self.destination.unchecked_transaction()?))
    }

    fn create_schema(&self, report: &mut CopyReport) -> Result<()> {
        if self.options.clear_destination_first {
            self.destination
                .execute_batch(&drop_table_if_exists_sql(self.destination_table))?;
            debug!("dropped destination table");
            report.destination_cleared = true;
        }

        let Some(create_sql) = self.source.table_schema(self.source_table)? else {
            warn!("source table not found in catalog; destination schema not created");
            return Ok(());
        };

        let ddl = rewrite_create_table(&create_sql, self.destination_table)?;
        debug!(sql = %ddl, "creating destination table");
        self.destination.execute_batch(&ddl)?;
        report.schema_created = true;
        Ok(())
    }

    fn copy_rows(&self, report: &mut CopyReport) -> Result<()> {
        let mut select = self.source.prepare(&select_all_sql(self.source_table))?;
        let columns: Vec<String> = select.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut rows = select.query([])?;

        // Both built once, when the first row arrives.
        let mut head: Option<String> = None;
        let mut bound_statement: Option<String> = None;

        while let Some(row) = rows.next()? {
            let ordinal = report.rows_read;
            report.rows_read += 1;

            let head: &str = head.get_or_insert_with(|| {
                insert_prefix(self.options.insert_verb, self.destination_table, &columns)
            });

            let affected = match self.options.value_mode {
                ValueMode::Bound => {
                    let statement = bound_statement
                        .get_or_insert_with(|| format!("{head}({});", placeholders(width)));
                    let values = (0..width)
                        .map(|i| row.get::<_, Value>(i))
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    self.destination
                        .prepare_cached(statement)?
                        .execute(params_from_iter(values))?
                }
                ValueMode::Literal => {
                    let literals = (0..width)
                        .map(|i| row.get_ref(i).map(|v| quote_literal(&value_to_text(v))))
                        .collect::<rusqlite::Result<Vec<_>>>()?
                        .join(", ");
                    self.destination.execute(&format!("{head}({literals});"), [])?
                }
            };

            report.rows_written += affected;
            if affected != 1 {
                self.row_mismatch(report, ordinal, affected)?;
            }
        }

        Ok(())
    }

    fn row_mismatch(&self, report: &mut CopyReport, row: usize, affected: usize) -> Result<()> {
        warn!(row, affected, "insert did not affect exactly one row");
        report.mismatches.push(RowMismatch { row, affected });

        match self.options.on_row_mismatch {
            MismatchPolicy::Record => Ok(()),
            MismatchPolicy::Fail => Err(SqliteError::RowCountMismatch {
                table: self.destination_table.to_string(),
                row,
                affected,
            }),
        }
    }
}
