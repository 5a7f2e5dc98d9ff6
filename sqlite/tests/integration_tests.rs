//! Integration tests for the sqlverb-sqlite crate.

use rusqlite::Connection;
use rusqlite::types::Value;
use sqlverb_sqlite::{
    ConnectionExt, CopyOptions, CopyOutcome, InsertVerb, MismatchPolicy, RowMismatch,
    SqliteError, ValueMode, replicate_table,
};

/// Source database with `T(id INTEGER PRIMARY KEY, name TEXT)` holding `(1,'a'), (2,'b')`.
fn source_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO T VALUES (1, 'a'), (2, 'b');",
    )
    .unwrap();
    conn
}

/// Destination database with an empty copy of `T`.
fn destination_with_table() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);")
        .unwrap();
    conn
}

/// All `(id, name)` rows of a table, ordered by id.
fn id_name_rows(conn: &Connection, table: &str) -> Vec<(i64, String)> {
    let mut stmt = conn
        .prepare(&format!("SELECT id, name FROM \"{table}\" ORDER BY id"))
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    conn.query(&format!("SELECT name FROM pragma_table_info('{table}') ORDER BY cid"))
        .unwrap()
        .rows()
        .iter()
        .map(|row| match &row[0] {
            Value::Text(name) => name.clone(),
            other => panic!("unexpected column name value: {other:?}"),
        })
        .collect()
}

fn copied(outcome: CopyOutcome) -> sqlverb_sqlite::CopyReport {
    outcome.into_report().expect("copy should not be rejected")
}

// =============================================================================
// Guard
// =============================================================================

#[test]
fn test_self_copy_returns_false_and_leaves_table_untouched() {
    let conn = source_db();
    let options = CopyOptions::new().create_schema().clear_destination();

    let outcome = replicate_table(&conn, "T", None, &options).unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome, CopyOutcome::SelfCopy);

    let outcome = replicate_table(&conn, "T", Some(&conn), &options).unwrap();
    assert!(!outcome.is_success());

    assert_eq!(id_name_rows(&conn, "T"), vec![(1, "a".into()), (2, "b".into())]);
}

#[test]
fn test_same_table_name_on_other_connection_is_not_self_copy() {
    let source = source_db();
    let destination = destination_with_table();
    let outcome = source.copy_table_to("T", &destination, &CopyOptions::new()).unwrap();
    assert!(outcome.is_success());
}

// =============================================================================
// Row copy
// =============================================================================

#[test]
fn test_concrete_scenario_schema_and_rows() {
    let source = source_db();
    let destination = Connection::open_in_memory().unwrap();

    let options = CopyOptions::new()
        .create_schema()
        .with_insert_verb(InsertVerb::Insert);
    let report = copied(replicate_table(&source, "T", Some(&destination), &options).unwrap());

    assert!(report.schema_created);
    assert!(!report.destination_cleared);
    assert_eq!(report.rows_read, 2);
    assert_eq!(report.rows_written, 2);
    assert!(report.is_clean());

    let ddl = destination.table_schema("T").unwrap().unwrap();
    assert!(ddl.starts_with(r#"CREATE TABLE "T" ("#), "got: {ddl}");

    let rows = destination.query("SELECT id, name FROM T").unwrap();
    assert_eq!(
        rows.rows(),
        [
            vec![Value::Integer(1), Value::Text("a".into())],
            vec![Value::Integer(2), Value::Text("b".into())],
        ]
    );
}

#[test]
fn test_row_count_preserved_with_existing_rows() {
    let source = source_db();
    let destination = destination_with_table();
    destination
        .execute_batch("INSERT INTO T VALUES (10, 'x'), (11, 'y'), (12, 'z');")
        .unwrap();

    let report = copied(source.copy_table_to("T", &destination, &CopyOptions::new()).unwrap());

    assert_eq!(report.rows_written, 2);
    assert_eq!(destination.count_rows("T").unwrap(), 5);
    let rows = id_name_rows(&destination, "T");
    assert_eq!(&rows[..2], &[(1, "a".to_string()), (2, "b".to_string())]);
}

#[test]
fn test_columns_matched_by_name_not_position() {
    let source = source_db();
    let destination = Connection::open_in_memory().unwrap();
    destination
        .execute_batch("CREATE TABLE T (name TEXT, id INTEGER PRIMARY KEY);")
        .unwrap();

    source.copy_table_to("T", &destination, &CopyOptions::new()).unwrap();
    assert_eq!(
        id_name_rows(&destination, "T"),
        vec![(1, "a".into()), (2, "b".into())]
    );
}

#[test]
fn test_schema_round_trip_column_set() {
    let source = Connection::open_in_memory().unwrap();
    source
        .execute_batch(
            "CREATE TABLE wide (
                id INTEGER PRIMARY KEY,
                label TEXT NOT NULL,
                score REAL,
                data BLOB,
                created TEXT DEFAULT CURRENT_TIMESTAMP
            );",
        )
        .unwrap();
    let destination = Connection::open_in_memory().unwrap();

    let options = CopyOptions::new().create_schema().with_destination_table("wide_copy");
    source.copy_table_to("wide", &destination, &options).unwrap();

    assert_eq!(column_names(&source, "wide"), column_names(&destination, "wide_copy"));
    assert_eq!(destination.count_rows("wide_copy").unwrap(), 0);
}

#[test]
fn test_copy_within_connection_to_new_table() {
    let conn = source_db();
    let options = CopyOptions::new().with_destination_table("T_backup").create_schema();

    let report = copied(conn.copy_table("T", &options).unwrap());
    assert_eq!(report.destination_table, "T_backup");
    assert_eq!(id_name_rows(&conn, "T_backup"), id_name_rows(&conn, "T"));
}

// =============================================================================
// Clear and replace
// =============================================================================

#[test]
fn test_clear_then_copy_is_idempotent() {
    let source = source_db();
    let destination = destination_with_table();
    let options = CopyOptions::new().clear_destination();

    let first = copied(source.copy_table_to("T", &destination, &options).unwrap());
    let after_first = id_name_rows(&destination, "T");
    let second = copied(source.copy_table_to("T", &destination, &options).unwrap());
    let after_second = id_name_rows(&destination, "T");

    assert!(first.destination_cleared && second.destination_cleared);
    assert_eq!(after_first, after_second);
    assert_eq!(after_second.len(), 2);
}

#[test]
fn test_drop_and_recreate_is_idempotent() {
    let source = source_db();
    let destination = Connection::open_in_memory().unwrap();
    let options = CopyOptions::new().create_schema().clear_destination();

    source.copy_table_to("T", &destination, &options).unwrap();
    destination.execute_sql("INSERT INTO T VALUES (99, 'stale')").unwrap();
    source.copy_table_to("T", &destination, &options).unwrap();

    assert_eq!(
        id_name_rows(&destination, "T"),
        vec![(1, "a".into()), (2, "b".into())]
    );
}

#[test]
fn test_create_schema_without_clear_fails_on_existing_table() {
    let source = source_db();
    let destination = destination_with_table();
    let err = source
        .copy_table_to("T", &destination, &CopyOptions::new().create_schema())
        .unwrap_err();
    assert!(matches!(err, SqliteError::DatabaseError(_)));
}

#[test]
fn test_conflict_insert_fails_and_replace_overwrites() {
    let source = source_db();
    let destination = destination_with_table();
    destination.execute_sql("INSERT INTO T VALUES (1, 'old')").unwrap();

    let err = source
        .copy_table_to("T", &destination, &CopyOptions::new())
        .unwrap_err();
    assert!(matches!(err, SqliteError::DatabaseError(_)));
    assert_eq!(id_name_rows(&destination, "T"), vec![(1, "old".into())]);

    let options = CopyOptions::new().with_insert_verb(InsertVerb::InsertOrReplace);
    let report = copied(source.copy_table_to("T", &destination, &options).unwrap());
    assert!(report.is_clean());
    assert_eq!(
        id_name_rows(&destination, "T"),
        vec![(1, "a".into()), (2, "b".into())]
    );
}

// =============================================================================
// Transactions and failure policy
// =============================================================================

#[test]
fn test_failure_inside_transaction_rolls_back_everything() {
    let source = source_db();
    let destination = destination_with_table();
    destination.execute_sql("INSERT INTO T VALUES (2, 'taken')").unwrap();

    assert!(source.copy_table_to("T", &destination, &CopyOptions::new()).is_err());

    // Row 1 was inserted before the conflict on row 2 and must be gone.
    assert_eq!(id_name_rows(&destination, "T"), vec![(2, "taken".into())]);
    assert!(destination.is_autocommit());
}

#[test]
fn test_failure_without_transaction_keeps_earlier_rows() {
    let source = source_db();
    let destination = destination_with_table();
    destination.execute_sql("INSERT INTO T VALUES (2, 'taken')").unwrap();

    let options = CopyOptions::new().without_transaction();
    assert!(source.copy_table_to("T", &destination, &options).is_err());

    assert_eq!(
        id_name_rows(&destination, "T"),
        vec![(1, "a".into()), (2, "taken".into())]
    );
}

#[test]
fn test_clear_rolls_back_with_failed_copy() {
    let source = source_db();
    let destination = Connection::open_in_memory().unwrap();
    destination
        .execute_batch(
            "CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO T VALUES (7, 'kept');
             CREATE TRIGGER reject BEFORE INSERT ON T WHEN NEW.id = 2
             BEGIN SELECT RAISE(ABORT, 'no'); END;",
        )
        .unwrap();

    // Clearing without schema creation keeps the trigger, which aborts row 2.
    let options = CopyOptions::new().clear_destination();
    assert!(source.copy_table_to("T", &destination, &options).is_err());
    assert_eq!(id_name_rows(&destination, "T"), vec![(7, "kept".into())]);
}

#[test]
fn test_copy_joins_caller_transaction() {
    let source = source_db();
    let destination = destination_with_table();

    let tx = destination.unchecked_transaction().unwrap();
    source.copy_table_to("T", &destination, &CopyOptions::new()).unwrap();
    assert_eq!(destination.count_rows("T").unwrap(), 2);
    drop(tx);

    assert_eq!(destination.count_rows("T").unwrap(), 0);
}

/// Destination whose trigger silently skips the row with id 2.
fn destination_skipping_id_2() -> Connection {
    let conn = destination_with_table();
    conn.execute_batch(
        "CREATE TRIGGER skip_two BEFORE INSERT ON T WHEN NEW.id = 2
         BEGIN SELECT RAISE(IGNORE); END;",
    )
    .unwrap();
    conn
}

#[test]
fn test_row_mismatch_recorded_and_copy_continues() {
    let source = source_db();
    let destination = destination_skipping_id_2();

    let report = copied(source.copy_table_to("T", &destination, &CopyOptions::new()).unwrap());

    assert_eq!(report.rows_read, 2);
    assert_eq!(report.rows_written, 1);
    assert_eq!(report.mismatches, vec![RowMismatch { row: 1, affected: 0 }]);
    assert!(!report.is_clean());
    assert_eq!(id_name_rows(&destination, "T"), vec![(1, "a".into())]);
}

#[test]
fn test_row_mismatch_fails_when_policy_says_so() {
    let source = source_db();
    let destination = destination_skipping_id_2();

    let options = CopyOptions::new().with_mismatch_policy(MismatchPolicy::Fail);
    let err = source.copy_table_to("T", &destination, &options).unwrap_err();

    match err {
        SqliteError::RowCountMismatch { table, row, affected } => {
            assert_eq!(table, "T");
            assert_eq!(row, 1);
            assert_eq!(affected, 0);
        }
        other => panic!("expected RowCountMismatch, got {other:?}"),
    }
    assert_eq!(destination.count_rows("T").unwrap(), 0);
}

#[test]
fn test_missing_catalog_entry_surfaces_at_first_insert() {
    let source = Connection::open_in_memory().unwrap();
    // Temp tables live in sqlite_temp_master, so the catalog lookup misses.
    source
        .execute_batch("CREATE TEMP TABLE scratch (x); INSERT INTO scratch VALUES (1);")
        .unwrap();
    let destination = Connection::open_in_memory().unwrap();

    let err = source
        .copy_table_to("scratch", &destination, &CopyOptions::new().create_schema())
        .unwrap_err();
    assert!(matches!(err, SqliteError::DatabaseError(_)));
    assert!(!ConnectionExt::table_exists(&destination, "scratch").unwrap());
}

// =============================================================================
// Value modes
// =============================================================================

fn untyped_source() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE v (a, b, c, d);").unwrap();
    conn.execute(
        "INSERT INTO v VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![42, Option::<String>::None, 2.5, vec![0xCAu8, 0xFE]],
    )
    .unwrap();
    conn
}

#[test]
fn test_bound_mode_preserves_storage_classes() {
    let source = untyped_source();
    let destination = Connection::open_in_memory().unwrap();

    source
        .copy_table_to("v", &destination, &CopyOptions::new().create_schema())
        .unwrap();

    let rows = destination.query("SELECT a, b, c, d FROM v").unwrap();
    assert_eq!(
        rows.rows()[0],
        vec![
            Value::Integer(42),
            Value::Null,
            Value::Real(2.5),
            Value::Blob(vec![0xCA, 0xFE]),
        ]
    );
}

#[test]
fn test_literal_mode_stores_text() {
    let source = untyped_source();
    let destination = Connection::open_in_memory().unwrap();

    let options = CopyOptions::new()
        .create_schema()
        .with_value_mode(ValueMode::Literal);
    source.copy_table_to("v", &destination, &options).unwrap();

    let types = destination
        .query("SELECT typeof(a), typeof(b), typeof(c), typeof(d) FROM v")
        .unwrap();
    assert!(types.rows()[0].iter().all(|t| *t == Value::Text("text".into())));
    assert_eq!(
        destination.query_scalar("SELECT a || '|' || b || '|' || c FROM v").unwrap(),
        Some(Value::Text("42||2.5".into()))
    );
}

#[test]
fn test_literal_mode_escapes_single_quotes() {
    let source = Connection::open_in_memory().unwrap();
    source
        .execute_batch(
            "CREATE TABLE q (s TEXT);
             INSERT INTO q VALUES ('it''s'), ('''; DROP TABLE q; --');",
        )
        .unwrap();
    let destination = Connection::open_in_memory().unwrap();

    let options = CopyOptions::new()
        .create_schema()
        .with_value_mode(ValueMode::Literal);
    let report = copied(source.copy_table_to("q", &destination, &options).unwrap());
    assert_eq!(report.rows_written, 2);

    let rows = destination.query("SELECT s FROM q ORDER BY rowid").unwrap();
    assert_eq!(rows.value(0, "s"), Some(&Value::Text("it's".into())));
    assert_eq!(rows.value(1, "s"), Some(&Value::Text("'; DROP TABLE q; --".into())));
}

#[test]
fn test_literal_mode_numeric_affinity_converts_back() {
    let source = source_db();
    let destination = Connection::open_in_memory().unwrap();
    let options = CopyOptions::new()
        .create_schema()
        .with_value_mode(ValueMode::Literal);

    source.copy_table_to("T", &destination, &options).unwrap();
    assert_eq!(
        id_name_rows(&destination, "T"),
        vec![(1, "a".into()), (2, "b".into())]
    );
}

// =============================================================================
// File-backed databases
// =============================================================================

#[test]
fn test_copy_between_database_files() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("source.db");
    let destination_path = dir.path().join("destination.db");

    {
        let source = Connection::open(&source_path).unwrap();
        source
            .execute_batch(
                "CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);
                 INSERT INTO T VALUES (1, 'a'), (2, 'b');",
            )
            .unwrap();
        let destination = Connection::open(&destination_path).unwrap();
        let options = CopyOptions::new().create_schema().clear_destination();
        source.copy_table_to("T", &destination, &options).unwrap();
    }

    let reopened = Connection::open(&destination_path).unwrap();
    assert_eq!(
        id_name_rows(&reopened, "T"),
        vec![(1, "a".into()), (2, "b".into())]
    );
}

#[test]
fn test_second_connection_to_same_file_is_self_copy() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let path = dir.path().join("a.db");

    let source = Connection::open(&path).unwrap();
    source
        .execute_batch(
            "CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO T VALUES (1, 'a'), (2, 'b');",
        )
        .unwrap();
    let alias = Connection::open(dir.path().join("sub").join("..").join("a.db")).unwrap();

    let outcome = source.copy_table_to("t", &alias, &CopyOptions::new()).unwrap();
    assert_eq!(outcome, CopyOutcome::SelfCopy);
    assert_eq!(source.count_rows("T").unwrap(), 2);

    // A different table in the same file is still a normal copy.
    let options = CopyOptions::new().with_destination_table("T2").create_schema();
    let outcome = source.copy_table_to("T", &alias, &options).unwrap();
    assert_eq!(outcome.report().unwrap().rows_written, 2);
}
