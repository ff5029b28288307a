use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::database::{validate_identifier, HintDialect};

/// Database name used when none is configured
pub const DEFAULT_DATABASE_NAME: &str = "analytics";

/// Table prefix used when none is configured
pub const DEFAULT_TABLE_PREFIX: &str = "matomo_";

#[derive(Debug, Clone, Serialize)]
pub struct StatschemaConfig {
    /// Path to the directory holding the database files
    pub data_dir: String,

    /// Name of the database created when no explicit name is given
    pub database_name: String,

    /// Prefix prepended to every table name
    pub table_prefix: String,

    /// Dialect used for execution-time query hints
    pub hint_dialect: HintDialect,
}

const EMPTY_CONFIG: &str = r#"### statschema configuration file

### directory holding the database files
# data_dir = "~/.statschema"

### default database name, stored as <data_dir>/<database_name>.sqlite3
# database_name = "analytics"

### prefix prepended to every table name
# table_prefix = "matomo_"

### execution-time hint dialect: mysql, mariadb, tidb, none
# hint_dialect = "mysql"
"#;

impl Default for StatschemaConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            data_dir: format!("{}/.statschema", home_dir),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            hint_dialect: HintDialect::default(),
        }
    }
}

impl StatschemaConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<StatschemaConfig> {
        let mut builder = Config::builder();

        // By default use $HOME/.statschema/statschema.toml as the configuration file path
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not find home directory"))?
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
            .to_owned();

        let statschema_dir = format!("{}/.statschema", home_dir.as_str());

        // Add in toml configuration file
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(statschema_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create statschema directory: {}", e))?;
                let p = format!("{}/statschema.toml", statschema_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of STATSCHEMA)
        // E.g., `STATSCHEMA_TABLE_PREFIX=piwik_ ./statschema` would set the table prefix
        builder = builder.add_source(config::Environment::with_prefix("STATSCHEMA"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config, &statschema_dir)
    }

    /// Build a configuration from already collected key/value settings
    ///
    /// `default_data_dir` is used (and created) when `data_dir` is not set.
    pub fn from_map(config: &HashMap<String, String>, default_data_dir: &str) -> Result<Self> {
        let data_dir = match config.get("data_dir") {
            Some(p) => expand_home(p),
            None => {
                std::fs::create_dir_all(default_data_dir)
                    .map_err(|e| anyhow!("Unable to create data directory: {}", e))?;
                default_data_dir.to_string()
            }
        };

        let database_name = config
            .get("database_name")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());
        validate_identifier(&database_name, false)
            .map_err(|e| anyhow!("Invalid database_name setting: {}", e))?;

        let table_prefix = config
            .get("table_prefix")
            .cloned()
            .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
        validate_identifier(&table_prefix, true)
            .map_err(|e| anyhow!("Invalid table_prefix setting: {}", e))?;

        let hint_dialect = match config.get("hint_dialect") {
            Some(s) => s.parse().map_err(|e: String| anyhow!(e))?,
            None => HintDialect::default(),
        };

        Ok(StatschemaConfig {
            data_dir,
            database_name,
            table_prefix,
            hint_dialect,
        })
    }

    /// Get the path to the SQLite file of the named database
    pub fn database_path(&self, database_name: &str) -> PathBuf {
        let data_dir = self.data_dir.trim_end_matches('/');
        PathBuf::from(format!("{}/{}.sqlite3", data_dir, database_name))
    }

    /// Get the path to the SQLite file of the configured database
    pub fn default_database_path(&self) -> PathBuf {
        self.database_path(&self.database_name)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!("Data Directory:     {}", self.data_dir),
            format!("Database Name:      {}", self.database_name),
            format!(
                "Database Path:      {}",
                self.default_database_path().display()
            ),
            format!("Table Prefix:       {}", self.table_prefix),
            format!("Hint Dialect:       {}", self.hint_dialect),
        ]
        .join("\n")
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.statschema/statschema.toml", home_dir)
    }
}

/// Replace a leading `~` with the home directory
fn expand_home(path: &str) -> String {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}{}", home.to_string_lossy(), rest),
        _ => path.to_string(),
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
