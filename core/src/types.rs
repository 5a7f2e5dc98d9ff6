//! Copy configuration and result types.
//!
//! [`CopyOptions`] is resolved once at the start of a copy, before any
//! statement runs. [`CopyOutcome`] and [`CopyReport`] describe what happened.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Conflict policy clause used for every insert of a copy.
///
/// # Examples
///
/// ```
/// use sqlverb_core::InsertVerb;
///
/// assert_eq!(InsertVerb::default(), InsertVerb::Insert);
/// assert_eq!(InsertVerb::InsertOrReplace.as_sql(), "INSERT OR REPLACE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsertVerb {
    /// Plain `INSERT`; a key conflict fails the statement.
    #[default]
    Insert,
    /// `INSERT OR REPLACE`; a conflicting row is overwritten.
    InsertOrReplace,
}

impl InsertVerb {
    /// Returns the SQL keywords for this verb.
    pub fn as_sql(&self) -> &'static str {
        match self {
            InsertVerb::Insert => "INSERT",
            InsertVerb::InsertOrReplace => "INSERT OR REPLACE",
        }
    }
}

impl fmt::Display for InsertVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// How row values travel from the source cursor into the insert statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Values are bound as typed statement parameters. NULL, integer,
    /// real, text and blob values keep their storage class.
    #[default]
    Bound,
    /// Values are rendered as single-quoted text literals inside the
    /// statement text. Every value lands as TEXT; NULL becomes `''`.
    Literal,
}

/// What to do when an insert does not report exactly one affected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Log the mismatch, add it to the report, keep copying.
    #[default]
    Record,
    /// Abort the copy with an error.
    Fail,
}

/// Options for a single table copy.
///
/// Defaults: destination table equals the source table, plain `INSERT`,
/// no schema creation, no clearing, one transaction around the whole
/// copy, bound values, mismatches recorded.
///
/// # Examples
///
/// ```
/// use sqlverb_core::{CopyOptions, InsertVerb, ValueMode};
///
/// let options = CopyOptions::default();
/// assert!(options.use_transaction);
/// assert_eq!(options.insert_verb, InsertVerb::Insert);
/// assert_eq!(options.value_mode, ValueMode::Bound);
/// assert_eq!(options.resolve_destination_table("t"), "t");
///
/// let options = CopyOptions::new().clear_destination().without_transaction();
/// assert!(options.clear_destination_first);
/// assert!(!options.use_transaction);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyOptions {
    /// Destination table name; `None` reuses the source table name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_table: Option<String>,
    /// Insert verb used for every row.
    pub insert_verb: InsertVerb,
    /// Recreate the destination table from the source catalog first.
    pub create_schema_first: bool,
    /// Drop (with schema creation) or empty (without) the destination first.
    pub clear_destination_first: bool,
    /// Wrap all destination writes in one transaction.
    pub use_transaction: bool,
    /// How values are passed to the insert statement.
    pub value_mode: ValueMode,
    /// Reaction to an insert that does not affect exactly one row.
    pub on_row_mismatch: MismatchPolicy,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            destination_table: None,
            insert_verb: InsertVerb::Insert,
            create_schema_first: false,
            clear_destination_first: false,
            use_transaction: true,
            value_mode: ValueMode::Bound,
            on_row_mismatch: MismatchPolicy::Record,
        }
    }
}

impl CopyOptions {
    /// Creates options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the destination table name.
    pub fn with_destination_table(mut self, table: impl Into<String>) -> Self {
        self.destination_table = Some(table.into());
        self
    }

    /// Sets the insert verb.
    pub fn with_insert_verb(mut self, verb: InsertVerb) -> Self {
        self.insert_verb = verb;
        self
    }

    /// Enables schema creation before copying rows.
    pub fn create_schema(mut self) -> Self {
        self.create_schema_first = true;
        self
    }

    /// Enables clearing the destination before copying rows.
    pub fn clear_destination(mut self) -> Self {
        self.clear_destination_first = true;
        self
    }

    /// Lets every statement auto-commit on its own.
    pub fn without_transaction(mut self) -> Self {
        self.use_transaction = false;
        self
    }

    /// Sets the value mode.
    pub fn with_value_mode(mut self, mode: ValueMode) -> Self {
        self.value_mode = mode;
        self
    }

    /// Sets the mismatch policy.
    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.on_row_mismatch = policy;
        self
    }

    /// Returns the destination table, falling back to `source_table`.
    pub fn resolve_destination_table<'a>(&'a self, source_table: &'a str) -> &'a str {
        self.destination_table.as_deref().unwrap_or(source_table)
    }
}

/// An insert that did not report exactly one affected row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMismatch {
    /// Zero-based ordinal of the row in the source scan.
    pub row: usize,
    /// Affected-row count reported by the insert.
    pub affected: usize,
}

/// Summary of a completed copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReport {
    /// Source table name.
    pub source_table: String,
    /// Resolved destination table name.
    pub destination_table: String,
    /// Rows read from the source cursor.
    pub rows_read: usize,
    /// Sum of affected-row counts reported by the inserts.
    pub rows_written: usize,
    /// Whether a CREATE statement was executed on the destination.
    pub schema_created: bool,
    /// Whether the destination was dropped or emptied first.
    pub destination_cleared: bool,
    /// Inserts whose affected-row count was not exactly one.
    pub mismatches: Vec<RowMismatch>,
}

impl CopyReport {
    /// Creates an empty report for the given tables.
    pub fn new(source_table: impl Into<String>, destination_table: impl Into<String>) -> Self {
        Self {
            source_table: source_table.into(),
            destination_table: destination_table.into(),
            rows_read: 0,
            rows_written: 0,
            schema_created: false,
            destination_cleared: false,
            mismatches: Vec::new(),
        }
    }

    /// Returns `true` when every insert affected exactly one row.
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Result of a copy call that did not fail with an error.
///
/// [`is_success`](CopyOutcome::is_success) gives the plain boolean view:
/// `false` only for a rejected self-copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The copy ran to completion.
    Copied(CopyReport),
    /// Source and destination resolved to the same table on the same
    /// connection; nothing was touched.
    SelfCopy,
}

impl CopyOutcome {
    /// Returns `true` if the copy ran.
    pub fn is_success(&self) -> bool {
        matches!(self, CopyOutcome::Copied(_))
    }

    /// Returns the report of a completed copy.
    pub fn report(&self) -> Option<&CopyReport> {
        match self {
            CopyOutcome::Copied(report) => Some(report),
            CopyOutcome::SelfCopy => None,
        }
    }

    /// Consumes the outcome and returns the report of a completed copy.
    pub fn into_report(self) -> Option<CopyReport> {
        match self {
            CopyOutcome::Copied(report) => Some(report),
            CopyOutcome::SelfCopy => None,
        }
    }
}
