//! Database schema management
//!
//! This module defines the [`SchemaManager`] contract every database adapter
//! implements, together with the value types it exchanges with callers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::definitions::SchemaDefinitions;
use super::error::{SchemaError, SchemaResult};

/// Name of the option row holding the install version
pub const OPTION_INSTALL_VERSION: &str = "install_version";

/// Login of the well-known anonymous user
pub const ANONYMOUS_USER: &str = "anonymous";

/// A table of the analytics schema
///
/// The name carries no prefix; the creation statement is produced by
/// combining a prefix with the name and the column/constraint definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: &'static str,
    pub definition: &'static str,
}

impl TableDefinition {
    /// Render the `CREATE TABLE` statement for this table under `prefix`
    pub fn create_sql(&self, prefix: &str) -> String {
        create_table_sql(&format!("{}{}", prefix, self.name), self.definition)
    }
}

/// Live metadata for one column, as reported by the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Position of the column in the table, starting at 0
    pub cid: i64,
    pub name: String,
    /// Declared type, e.g. `INTEGER` or `VARCHAR(100)`
    pub data_type: String,
    pub nullable: bool,
    /// Default value expression, verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// 1-based position within the primary key, 0 when not part of it
    pub primary_key: i64,
}

/// Schema management for one logical database
///
/// Operations either complete or fail with a typed [`SchemaError`]; nothing is
/// retried internally. Database lifecycle operations take `&mut self`, all
/// others take `&self`. DDL is not serialized by implementations: concurrent
/// callers issuing DDL must coordinate themselves.
pub trait SchemaManager {
    /// Get the SQL to create a specific known table or monthly archive table
    ///
    /// Accepts the table name with or without the configured prefix. Archive
    /// tables are matched by their `archive_numeric_` / `archive_blob_` name.
    fn table_create_sql(&self, table_name: &str) -> SchemaResult<String> {
        let prefix = self.table_prefix();
        let unprefixed = table_name.strip_prefix(prefix).unwrap_or(table_name);

        for name in [table_name, unprefixed] {
            if let Some(table) = self.known_table(name) {
                return Ok(table.create_sql(prefix));
            }
        }
        for name in [table_name, unprefixed] {
            if let Some(definition) = SchemaDefinitions::archive_definition(name) {
                return Ok(create_table_sql(&format!("{}{}", prefix, name), &definition));
            }
        }

        Err(SchemaError::UnknownTable(table_name.to_string()))
    }

    /// Get the SQL to create all known tables, in declaration order
    fn tables_create_sql(&self) -> Vec<String> {
        self.table_definitions()
            .iter()
            .map(|table| table.create_sql(self.table_prefix()))
            .collect()
    }

    /// Create a new table named `prefix + name_without_prefix`
    ///
    /// Fails with [`SchemaError::TableAlreadyExists`] when the table is installed.
    fn create_table(&self, name_without_prefix: &str, create_definition: &str) -> SchemaResult<()>;

    /// Create the database, `None` meaning the configured database name
    ///
    /// An existing database is opened rather than treated as an error.
    fn create_database(&mut self, name: Option<&str>) -> SchemaResult<()>;

    /// Destroy the database and everything in it
    ///
    /// Irreversible; callers must guard against accidental invocation.
    fn drop_database(&mut self) -> SchemaResult<()>;

    /// Create every known table that is not installed yet
    fn create_tables(&self) -> SchemaResult<()>;

    /// Insert the anonymous user row, doing nothing if it already exists
    fn create_anonymous_user(&self) -> SchemaResult<()>;

    /// Persist the current software version as install version, only once
    fn record_install_version(&self) -> SchemaResult<()>;

    /// The version recorded at first install, `None` if never recorded
    fn install_version(&self) -> SchemaResult<Option<String>>;

    /// Delete all rows from every installed table, keeping the structure
    fn truncate_all_tables(&self) -> SchemaResult<()>;

    /// Prefixed names of all known tables; does not touch the database
    fn tables_names(&self) -> Vec<String> {
        self.table_definitions()
            .iter()
            .map(|table| format!("{}{}", self.table_prefix(), table.name))
            .collect()
    }

    /// Tables currently installed, served from cache unless `force_reload`
    fn tables_installed(&self, force_reload: bool) -> SchemaResult<BTreeSet<String>>;

    /// Live column metadata for one installed table, keyed by column name
    fn table_columns(&self, table_name: &str) -> SchemaResult<BTreeMap<String, ColumnDescriptor>>;

    /// Whether at least one table is installed
    fn has_tables(&self) -> SchemaResult<bool> {
        Ok(!self.tables_installed(true)?.is_empty())
    }

    /// Add an advisory max execution time hint when `limit_secs > 0`
    ///
    /// With the default MySQL dialect the result is the trimmed query with a
    /// ` /*+ MAX_EXECUTION_TIME(<ms>) */` comment inserted after its first
    /// `SELECT` keyword; removing that comment gives back `sql.trim()`. Queries
    /// without a `SELECT` keyword, or already carrying a hint, are returned
    /// unchanged. See [`HintDialect::apply`](super::HintDialect::apply) for the
    /// other dialects.
    fn add_max_execution_time_hint_to_query(&self, sql: &str, limit_secs: f64) -> String;

    /// Prefix applied to every table name
    fn table_prefix(&self) -> &str;

    /// The known table set, in declaration order
    fn table_definitions(&self) -> &'static [TableDefinition];

    /// Look up a known table by its unprefixed name
    fn known_table(&self, name: &str) -> Option<&'static TableDefinition> {
        self.table_definitions().iter().find(|t| t.name == name)
    }
}

/// Render a `CREATE TABLE` statement for an already prefixed table name
pub fn create_table_sql(full_name: &str, definition: &str) -> String {
    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(full_name),
        definition.trim()
    )
}

/// Double-quote an identifier for use in SQL
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check that a name only uses `[A-Za-z0-9_]`
///
/// Empty names are rejected unless `allow_empty` is set (an empty table prefix
/// is valid).
pub fn validate_identifier(name: &str, allow_empty: bool) -> SchemaResult<()> {
    if name.is_empty() && allow_empty {
        return Ok(());
    }
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SchemaError::InvalidName(name.to_string()));
    }
    Ok(())
}
