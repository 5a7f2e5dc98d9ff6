//! YAML copy plans.
//!
//! A plan names a source database file, an optional destination database
//! file and a list of table copies to run in order.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! source: data/source.db
//! destination: data/backup.db
//! jobs:
//!   - table: users
//!     create_schema_first: true
//!     clear_destination_first: true
//!   - table: events
//!     destination_table: events_archive
//!     insert_verb: insert_or_replace
//! ```

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::CopyOptions;
use crate::validate::{ValidationError, validate_plan};

/// Plan format version understood by [`CopyPlan`].
pub const PLAN_FORMAT_VERSION: &str = "1.0";

/// One table copy inside a [`CopyPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyJob {
    /// Source table name.
    pub table: String,
    /// Copy options; omitted keys take their defaults.
    #[serde(flatten)]
    pub options: CopyOptions,
}

impl CopyJob {
    pub fn new(table: impl Into<String>, options: CopyOptions) -> Self {
        Self {
            table: table.into(),
            options,
        }
    }
}

/// A list of table copies between two database files.
///
/// # Examples
///
/// ```
/// use sqlverb_core::{CopyPlan, InsertVerb};
///
/// let yaml = r#"
/// version: "1.0"
/// source: a.db
/// destination: b.db
/// jobs:
///   - table: users
///     insert_verb: insert_or_replace
/// "#;
/// let plan = CopyPlan::from_yaml_str(yaml).unwrap();
/// assert!(!plan.is_same_database());
/// assert_eq!(plan.jobs[0].options.insert_verb, InsertVerb::InsertOrReplace);
/// assert!(plan.validate().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyPlan {
    /// Plan format version (see [`PLAN_FORMAT_VERSION`]).
    pub version: String,
    /// Source database file.
    pub source: PathBuf,
    /// Destination database file; `None` copies within the source database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    /// Copies to run, in order.
    pub jobs: Vec<CopyJob>,
}

impl CopyPlan {
    /// Loads a plan from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::CoreError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::CoreError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let plan = serde_yaml::from_reader(reader)?;
        Ok(plan)
    }

    /// Saves the plan as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Parses a plan from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Returns `true` if the jobs read and write the same database file.
    ///
    /// Paths are compared with [`same_file`], so `dir/../a.db` and a
    /// symlink to `a.db` both count as `a.db`.
    pub fn is_same_database(&self) -> bool {
        self.destination
            .as_deref()
            .is_none_or(|destination| same_file(destination, &self.source))
    }

    /// Shorthand for [`validate_plan`].
    pub fn validate(&self) -> Vec<ValidationError> {
        validate_plan(self)
    }
}

/// Returns `true` if both paths name the same file.
///
/// Each path is resolved with [`fs::canonicalize`], which follows symlinks
/// and removes `.` and `..`. A path that does not exist yet is compared as
/// given.
pub fn same_file(a: &Path, b: &Path) -> bool {
    resolve(a) == resolve(b)
}

fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
