//! Monthly archive tables
//!
//! Processed reports are stored in one numeric and one blob table per month,
//! named `archive_numeric_YYYY_MM` and `archive_blob_YYYY_MM`. They are created
//! on demand and are not part of the static table set, but they count as
//! installed tables once they exist.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::SqliteSchema;
use crate::database::core::{SchemaDefinitions, SchemaError, SchemaManager, SchemaResult};

/// Kind of archive table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Numeric,
    Blob,
}

impl ArchiveKind {
    fn table_prefix(&self) -> &'static str {
        match self {
            ArchiveKind::Numeric => SchemaDefinitions::ARCHIVE_NUMERIC_PREFIX,
            ArchiveKind::Blob => SchemaDefinitions::ARCHIVE_BLOB_PREFIX,
        }
    }

    fn definition(&self) -> String {
        match self {
            ArchiveKind::Numeric => SchemaDefinitions::archive_numeric_definition(),
            ArchiveKind::Blob => SchemaDefinitions::archive_blob_definition(),
        }
    }

    /// Unprefixed archive table name for the month containing `date`
    pub fn table_name(&self, date: NaiveDate) -> String {
        format!("{}{}", self.table_prefix(), date.format("%Y_%m"))
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::Numeric => write!(f, "numeric"),
            ArchiveKind::Blob => write!(f, "blob"),
        }
    }
}

impl FromStr for ArchiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "numeric" => Ok(ArchiveKind::Numeric),
            "blob" => Ok(ArchiveKind::Blob),
            _ => Err(format!(
                "Unknown archive kind '{}'. Valid kinds: numeric, blob",
                s
            )),
        }
    }
}

impl SqliteSchema {
    /// Create the archive table of `kind` for the given month
    ///
    /// Returns the prefixed table name. Creating an archive table that already
    /// exists is not an error.
    pub fn create_archive_table(&self, kind: ArchiveKind, year: i32, month: u32) -> SchemaResult<String> {
        let date = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            SchemaError::InvalidName(format!("{}{}_{:02}", kind.table_prefix(), year, month))
        })?;
        let name = kind.table_name(date);

        match self.create_table(&name, &kind.definition()) {
            Ok(()) => {}
            Err(SchemaError::TableAlreadyExists(table)) => {
                debug!("Archive table {} already exists", table);
            }
            Err(e) => return Err(e),
        }

        Ok(format!("{}{}", self.table_prefix(), name))
    }

    /// Installed archive tables, reloaded from the database
    pub fn archive_tables(&self) -> SchemaResult<Vec<String>> {
        let prefix = self.table_prefix();
        Ok(self
            .tables_installed(true)?
            .into_iter()
            .filter(|table| {
                table
                    .strip_prefix(prefix)
                    .is_some_and(SchemaDefinitions::is_archive_table)
            })
            .collect())
    }
}
