use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use rusqlite::types::Value;
use sqlverb_core::{
    CopyOptions, CopyOutcome, CopyPlan, CopyReport, InsertVerb, MismatchPolicy, ValueMode,
    same_file,
};
use sqlverb_sqlite::{ConnectionExt, ResultSet, replicate_table};
use tracing::{Level, info};

/// Output format for `query` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum QueryFormat {
    Json,
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "sqlverb")]
#[command(about = "SQLite table copies and SQL verb helpers", version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value_t = Level::WARN)]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy one table's rows, and optionally its schema, to another table.
    Copy(CopyArgs),
    /// Run every table copy listed in a YAML plan.
    Plan(PlanArgs),
    /// Run a query and print its rows.
    Query(QueryArgs),
    /// Execute a statement and print the number of affected rows.
    Exec(ExecArgs),
    /// List tables with their row counts.
    Tables(TablesArgs),
}

#[derive(Debug, Args)]
struct CopyArgs {
    /// Source database file.
    #[arg(long)]
    source: PathBuf,
    /// Source table name.
    #[arg(long)]
    table: String,
    /// Destination database file (defaults to the source database).
    #[arg(long)]
    dest: Option<PathBuf>,
    /// Destination table name (defaults to the source table name).
    #[arg(long)]
    dest_table: Option<String>,
    /// Use INSERT OR REPLACE instead of plain INSERT.
    #[arg(long)]
    replace: bool,
    /// Recreate the destination table from the source schema first.
    #[arg(long)]
    create_schema: bool,
    /// Clear the destination table first (drops it with --create-schema).
    #[arg(long)]
    clear: bool,
    /// Let each statement auto-commit instead of wrapping the copy in a transaction.
    #[arg(long)]
    no_transaction: bool,
    /// Insert values as quoted text literals instead of typed parameters.
    #[arg(long)]
    literal: bool,
    /// Abort when an insert does not affect exactly one row.
    #[arg(long)]
    fail_on_mismatch: bool,
}

#[derive(Debug, Args)]
struct PlanArgs {
    /// Path to the YAML copy plan.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Database file.
    #[arg(long)]
    db: PathBuf,
    /// SQL query to run.
    #[arg(long)]
    sql: String,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: QueryFormat,
}

#[derive(Debug, Args)]
struct ExecArgs {
    /// Database file.
    #[arg(long)]
    db: PathBuf,
    /// SQL statement to execute.
    #[arg(long)]
    sql: String,
}

#[derive(Debug, Args)]
struct TablesArgs {
    /// Database file.
    #[arg(long)]
    db: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.log_level);

    let result = match cli.command {
        Command::Copy(args) => run_copy(args),
        Command::Plan(args) => run_plan(args),
        Command::Query(args) => run_query(args),
        Command::Exec(args) => run_exec(args),
        Command::Tables(args) => run_tables(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn setup_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// copy
// ---------------------------------------------------------------------------

fn run_copy(args: CopyArgs) -> Result<(), String> {
    let options = copy_options(&args);
    let source = open_database(&args.source)?;

    let destination = match &args.dest {
        Some(path) if !same_file(path, &args.source) => Some(open_database(path)?),
        _ => None,
    };

    let outcome = replicate_table(&source, &args.table, destination.as_ref(), &options)
        .map_err(|err| format!("Copy of table '{}' failed: {err}", args.table))?;
    let report = copied_report(outcome, &args.table)?;
    print_report(&report);
    Ok(())
}

fn copy_options(args: &CopyArgs) -> CopyOptions {
    let mut options = CopyOptions::new();
    if let Some(table) = &args.dest_table {
        options = options.with_destination_table(table.clone());
    }
    if args.replace {
        options = options.with_insert_verb(InsertVerb::InsertOrReplace);
    }
    if args.create_schema {
        options = options.create_schema();
    }
    if args.clear {
        options = options.clear_destination();
    }
    if args.no_transaction {
        options = options.without_transaction();
    }
    if args.literal {
        options = options.with_value_mode(ValueMode::Literal);
    }
    if args.fail_on_mismatch {
        options = options.with_mismatch_policy(MismatchPolicy::Fail);
    }
    options
}

fn copied_report(outcome: CopyOutcome, table: &str) -> Result<CopyReport, String> {
    outcome.into_report().ok_or_else(|| {
        format!("Source and destination are the same table '{table}'; nothing copied")
    })
}

fn print_report(report: &CopyReport) {
    println!(
        "{} -> {}: {} rows read, {} rows written",
        report.source_table, report.destination_table, report.rows_read, report.rows_written
    );
    if report.schema_created {
        println!("  schema created");
    }
    if report.destination_cleared {
        println!("  destination cleared");
    }
    for mismatch in &report.mismatches {
        println!(
            "  row {}: insert affected {} rows",
            mismatch.row, mismatch.affected
        );
    }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

fn run_plan(args: PlanArgs) -> Result<(), String> {
    let plan = CopyPlan::load(&args.config)
        .map_err(|err| format!("Failed to load plan '{}': {err}", args.config.display()))?;

    let errors = plan.validate();
    if !errors.is_empty() {
        let details = errors
            .iter()
            .map(|err| format!("  {err}"))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(format!(
            "Plan '{}' is invalid:\n{details}",
            args.config.display()
        ));
    }

    let source = open_database(&plan.source)?;
    let destination = match &plan.destination {
        Some(path) if !plan.is_same_database() => Some(open_database(path)?),
        _ => None,
    };

    info!(jobs = plan.jobs.len(), "running copy plan");
    for (index, job) in plan.jobs.iter().enumerate() {
        let outcome = replicate_table(&source, &job.table, destination.as_ref(), &job.options)
            .map_err(|err| {
                format!(
                    "Job {} (table '{}') failed: {err}",
                    index + 1,
                    job.table
                )
            })?;
        let report = copied_report(outcome, &job.table)?;
        print_report(&report);
    }

    println!("{} job(s) completed", plan.jobs.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// query / exec / tables
// ---------------------------------------------------------------------------

fn run_query(args: QueryArgs) -> Result<(), String> {
    let conn = open_database(&args.db)?;
    let result = conn
        .query(&args.sql)
        .map_err(|err| format!("Query failed: {err}"))?;

    match args.format {
        QueryFormat::Json => {
            let json = serde_json::to_string_pretty(&result.to_json())
                .map_err(|err| format!("JSON serialization failed: {err}"))?;
            println!("{json}");
        }
        QueryFormat::Table => print!("{}", format_table(&result)),
    }
    Ok(())
}

fn run_exec(args: ExecArgs) -> Result<(), String> {
    let conn = open_database(&args.db)?;
    let affected = conn
        .execute_sql(&args.sql)
        .map_err(|err| format!("Statement failed: {err}"))?;
    println!("{affected} row(s) affected");
    Ok(())
}

fn run_tables(args: TablesArgs) -> Result<(), String> {
    let conn = open_database(&args.db)?;
    let names = conn
        .table_names()
        .map_err(|err| format!("Failed to list tables: {err}"))?;

    for name in names {
        let count = conn
            .count_rows(&name)
            .map_err(|err| format!("Failed to count rows in '{name}': {err}"))?;
        println!("{name}\t{count}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn open_database(path: &Path) -> Result<Connection, String> {
    Connection::open(path)
        .map_err(|err| format!("Failed to open database '{}': {err}", path.display()))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

/// Renders a result set as left-aligned columns separated by two spaces.
fn format_table(result: &ResultSet) -> String {
    let cells: Vec<Vec<String>> = result
        .rows()
        .iter()
        .map(|row| row.iter().map(display_value).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns().iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |row: &[String]| -> String {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    };

    let mut out = render(result.columns());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&render(&rule));
    for row in &cells {
        out.push_str(&render(row));
    }
    out
}
