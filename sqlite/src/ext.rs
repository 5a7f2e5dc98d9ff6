//! SQL verb helpers on [`rusqlite::Connection`].
//!
//! [`ConnectionExt`] adds one-statement helpers named after the SQL verb
//! they issue, plus catalog lookups and the table copy entry points. Table
//! and column names are always quoted; data values are bound as parameters.
//!
//! # Example
//!
//! ```
//! use rusqlite::Connection;
//! use rusqlite::types::Value;
//! use sqlverb_sqlite::ConnectionExt;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! conn.execute_sql("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
//!
//! conn.insert("t", &[("id", Value::Integer(1)), ("name", Value::Text("a".into()))]).unwrap();
//! conn.insert_or_replace("t", &[("id", Value::Integer(1)), ("name", Value::Text("b".into()))])
//!     .unwrap();
//!
//! let rows = conn.query("SELECT name FROM t").unwrap();
//! assert_eq!(rows.value(0, "name"), Some(&Value::Text("b".into())));
//!
//! assert_eq!(conn.delete("t", Some("id = ?1"), [1]).unwrap(), 1);
//! assert_eq!(conn.count_rows("t").unwrap(), 0);
//! ```

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Params, params_from_iter};
use sqlverb_core::sql;
use sqlverb_core::{CopyOptions, CopyOutcome, InsertVerb, validate_identifier};
use tracing::debug;

use crate::convert::value_to_json;
use crate::error::Result;
use crate::replicate::replicate_table;

const TABLE_EXISTS_SQL: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1";

/// Materialized result of [`ConnectionExt::query`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in result order; each row has one value per column.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched ASCII case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| sql::identifiers_equal(c, name))
    }

    /// Value at `row` in the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Renders the rows as a JSON array of objects keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let object = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.clone(), value_to_json(value)))
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

/// SQL verb helpers for a SQLite connection.
///
/// Every helper runs exactly one statement and returns what the client
/// library reports; nothing is retried.
pub trait ConnectionExt {
    /// Inserts one row given as `(column, value)` pairs. An empty slice
    /// inserts a row of column defaults. Returns the affected-row count.
    fn insert(&self, table: &str, values: &[(&str, Value)]) -> Result<usize>;

    /// Like [`insert`](Self::insert) with `INSERT OR REPLACE`.
    fn insert_or_replace(&self, table: &str, values: &[(&str, Value)]) -> Result<usize>;

    /// Deletes rows matching `where_clause` (all rows when `None`).
    /// `params` bind to placeholders in the clause.
    fn delete<P: Params>(&self, table: &str, where_clause: Option<&str>, params: P)
    -> Result<usize>;

    /// Executes a single non-query statement and returns the affected-row count.
    fn execute_sql(&self, sql: &str) -> Result<usize>;

    /// Runs a query and collects every row.
    fn query(&self, sql: &str) -> Result<ResultSet>;

    /// First column of the first row, or `None` for an empty result.
    fn query_scalar(&self, sql: &str) -> Result<Option<Value>>;

    /// Returns `true` if a table with this exact name exists.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// The table's CREATE statement from the catalog.
    fn table_schema(&self, table: &str) -> Result<Option<String>>;

    /// User table names, sorted.
    fn table_names(&self) -> Result<Vec<String>>;

    fn count_rows(&self, table: &str) -> Result<usize>;

    /// Copies a table within this connection. See [`replicate_table`].
    fn copy_table(&self, source_table: &str, options: &CopyOptions) -> Result<CopyOutcome>;

    /// Copies a table from this connection into `destination`. See
    /// [`replicate_table`].
    fn copy_table_to(
        &self,
        source_table: &str,
        destination: &Connection,
        options: &CopyOptions,
    ) -> Result<CopyOutcome>;
}

impl ConnectionExt for Connection {
    fn insert(&self, table: &str, values: &[(&str, Value)]) -> Result<usize> {
        insert_row(self, InsertVerb::Insert, table, values)
    }

    fn insert_or_replace(&self, table: &str, values: &[(&str, Value)]) -> Result<usize> {
        insert_row(self, InsertVerb::InsertOrReplace, table, values)
    }

    fn delete<P: Params>(
        &self,
        table: &str,
        where_clause: Option<&str>,
        params: P,
    ) -> Result<usize> {
        validate_identifier(table)?;
        let mut statement = sql::delete_all_sql(table);
        if let Some(clause) = where_clause {
            statement.push_str(" WHERE ");
            statement.push_str(clause);
        }
        debug!(sql = %statement, "delete");
        Ok(self.execute(&statement, params)?)
    }

    fn execute_sql(&self, sql: &str) -> Result<usize> {
        debug!(sql, "execute");
        Ok(self.execute(sql, [])?)
    }

    fn query(&self, sql: &str) -> Result<ResultSet> {
        debug!(sql, "query");
        let mut stmt = self.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ResultSet { columns, rows })
    }

    fn query_scalar(&self, sql: &str) -> Result<Option<Value>> {
        debug!(sql, "query scalar");
        Ok(self
            .query_row(sql, [], |row| row.get::<_, Value>(0))
            .optional()?)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.query_row(TABLE_EXISTS_SQL, [table], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn table_schema(&self, table: &str) -> Result<Option<String>> {
        let schema = self
            .query_row(sql::CATALOG_TABLE_SQL, [table], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(schema.flatten())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.prepare(sql::TABLE_NAMES_SQL)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        validate_identifier(table)?;
        let count: i64 = self.query_row(&sql::count_rows_sql(table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn copy_table(&self, source_table: &str, options: &CopyOptions) -> Result<CopyOutcome> {
        replicate_table(self, source_table, None, options)
    }

    fn copy_table_to(
        &self,
        source_table: &str,
        destination: &Connection,
        options: &CopyOptions,
    ) -> Result<CopyOutcome> {
        replicate_table(self, source_table, Some(destination), options)
    }
}

fn insert_row(
    conn: &Connection,
    verb: InsertVerb,
    table: &str,
    values: &[(&str, Value)],
) -> Result<usize> {
    validate_identifier(table)?;
    if values.is_empty() {
        let statement = sql::insert_default_values_sql(verb, table);
        debug!(sql = %statement, "insert");
        return Ok(conn.execute(&statement, [])?);
    }

    let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
    for column in &columns {
        validate_identifier(column)?;
    }
    let statement = sql::insert_sql(verb, table, &columns, &sql::placeholders(values.len()));
    debug!(sql = %statement, "insert");
    Ok(conn.execute(&statement, params_from_iter(values.iter().map(|(_, value)| value)))?)
}
