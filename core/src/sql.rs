//! Textual SQL builders for the SQLite dialect.
//!
//! Identifiers are always double-quoted and literals single-quoted, with the
//! quote character doubled inside. Data values are normally bound as
//! parameters; [`quote_literal`] exists for the literal value mode.

use std::ops::Range;

use crate::error::{CoreError, Result};
use crate::types::InsertVerb;

/// Catalog lookup for a table's CREATE statement. Binds the table name as `?1`.
pub const CATALOG_TABLE_SQL: &str =
    "SELECT sql FROM sqlite_master WHERE type='table' AND name=?1";

/// Lists user tables, skipping SQLite's internal `sqlite_*` tables.
pub const TABLE_NAMES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

/// Quotes an identifier with double quotes.
///
/// ```
/// use sqlverb_core::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("users"), r#""users""#);
/// assert_eq!(quote_identifier(r#"a"b"#), r#""a""b""#);
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a text value as a single-quoted SQL literal.
///
/// ```
/// use sqlverb_core::sql::quote_literal;
///
/// assert_eq!(quote_literal("it's"), "'it''s'");
/// ```
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Compares two table names the way SQLite resolves them (ASCII case-insensitive).
pub fn identifiers_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}

pub fn delete_all_sql(table: &str) -> String {
    format!("DELETE FROM {}", quote_identifier(table))
}

pub fn drop_table_if_exists_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(table))
}

pub fn count_rows_sql(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_identifier(table))
}

/// Joins quoted column names with commas.
pub fn column_list<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Numbered parameter placeholders `?1, ?2, ...` for `count` values.
pub fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the statement head `<verb> INTO "<table>" ("c1", ...) VALUES `.
///
/// A copy computes this once and appends a value tuple per row.
pub fn insert_prefix<S: AsRef<str>>(verb: InsertVerb, table: &str, columns: &[S]) -> String {
    format!(
        "{} INTO {} ({}) VALUES ",
        verb.as_sql(),
        quote_identifier(table),
        column_list(columns)
    )
}

/// Builds `<verb> INTO "<table>" ("c1", ...) VALUES (<values>);`.
///
/// `values` is inserted verbatim, so it is either a placeholder list or a
/// list of already quoted literals.
///
/// ```
/// use sqlverb_core::{InsertVerb, sql};
///
/// let stmt = sql::insert_sql(InsertVerb::Insert, "t", &["id", "name"], &sql::placeholders(2));
/// assert_eq!(stmt, r#"INSERT INTO "t" ("id", "name") VALUES (?1, ?2);"#);
/// ```
pub fn insert_sql<S: AsRef<str>>(
    verb: InsertVerb,
    table: &str,
    columns: &[S],
    values: &str,
) -> String {
    format!("{}({values});", insert_prefix(verb, table, columns))
}

/// Builds an insert of a row made only of column defaults.
pub fn insert_default_values_sql(verb: InsertVerb, table: &str) -> String {
    format!("{} INTO {} DEFAULT VALUES;", verb.as_sql(), quote_identifier(table))
}

/// Replaces the table name in a catalog CREATE statement with `destination`.
///
/// Accepts `CREATE [TEMP|TEMPORARY] [VIRTUAL] TABLE [IF NOT EXISTS] <name>`
/// where `<name>` is bare, `"quoted"`, `[bracketed]` or `` `ticked` ``,
/// optionally schema-qualified. The whole name, qualifier included, is
/// replaced by the double-quoted destination; everything after it is kept
/// byte for byte.
///
/// Only the header name changes. A self-referencing foreign key such as
/// `REFERENCES T(id)` in the column list still names the source table, so
/// the copy's foreign key points back at the source.
///
/// # Errors
///
/// Returns [`CoreError::UnrecognizedCreateStatement`] if the header does not
/// match the shape above.
///
/// # Examples
///
/// ```
/// use sqlverb_core::sql::rewrite_create_table;
///
/// let ddl = rewrite_create_table("CREATE TABLE main.[T](id INTEGER)", "T2").unwrap();
/// assert_eq!(ddl, r#"CREATE TABLE "T2"(id INTEGER)"#);
/// ```
pub fn rewrite_create_table(create_sql: &str, destination: &str) -> Result<String> {
    let span = table_name_span(create_sql)
        .ok_or_else(|| CoreError::UnrecognizedCreateStatement(create_sql.to_string()))?;

    let quoted = quote_identifier(destination);
    let mut out = String::with_capacity(create_sql.len() + quoted.len());
    out.push_str(&create_sql[..span.start]);
    out.push_str(&quoted);
    out.push_str(&create_sql[span.end..]);
    Ok(out)
}

fn table_name_span(sql: &str) -> Option<Range<usize>> {
    let mut scanner = HeaderScanner { sql, pos: 0 };

    scanner.keyword("CREATE")?;
    if !scanner.keyword_opt("TEMP") {
        scanner.keyword_opt("TEMPORARY");
    }
    scanner.keyword_opt("VIRTUAL");
    scanner.keyword("TABLE")?;
    if scanner.keyword_opt("IF") {
        scanner.keyword("NOT")?;
        scanner.keyword("EXISTS")?;
    }

    let first = scanner.identifier()?;
    if scanner.punct('.') {
        let second = scanner.identifier()?;
        return Some(first.start..second.end);
    }
    Some(first)
}

/// Forward-only scanner over the head of a CREATE statement.
struct HeaderScanner<'a> {
    sql: &'a str,
    pos: usize,
}

impl<'a> HeaderScanner<'a> {
    fn rest(&self) -> &'a str {
        &self.sql[self.pos..]
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("--") {
                self.pos += trimmed.find('\n').map_or(trimmed.len(), |i| i + 1);
            } else if trimmed.starts_with("/*") {
                self.pos += trimmed.find("*/").map_or(trimmed.len(), |i| i + 2);
            } else {
                return;
            }
        }
    }

    fn word(&mut self) -> Option<Range<usize>> {
        self.skip_trivia();
        let len: usize = self
            .rest()
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
            .map(char::len_utf8)
            .sum();
        (len > 0).then(|| self.pos..self.pos + len)
    }

    fn keyword_opt(&mut self, keyword: &str) -> bool {
        match self.word() {
            Some(range) if self.sql[range.clone()].eq_ignore_ascii_case(keyword) => {
                self.pos = range.end;
                true
            }
            _ => false,
        }
    }

    fn keyword(&mut self, keyword: &str) -> Option<()> {
        self.keyword_opt(keyword).then_some(())
    }

    fn punct(&mut self, c: char) -> bool {
        self.skip_trivia();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Option<Range<usize>> {
        self.skip_trivia();
        let first = self.rest().chars().next()?;
        match first {
            '"' => self.quoted('"'),
            '`' => self.quoted('`'),
            '\'' => self.quoted('\''),
            '[' => self.quoted(']'),
            _ => {
                let range = self.word()?;
                self.pos = range.end;
                Some(range)
            }
        }
    }

    /// Consumes a quoted name whose opening quote is at `pos`. A doubled
    /// closing quote is an escape, except for `]`.
    fn quoted(&mut self, close: char) -> Option<Range<usize>> {
        let sql = self.sql;
        let start = self.pos;
        let body = start + 1;
        let mut chars = sql[body..].char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c != close {
                continue;
            }
            if close != ']' && matches!(chars.peek(), Some((_, next)) if *next == close) {
                chars.next();
                continue;
            }
            let end = body + i + c.len_utf8();
            self.pos = end;
            return Some(start..end);
        }
        None
    }
}
