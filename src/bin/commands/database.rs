use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use statschema::{OutputFormat, SchemaManager, SqliteSchema, StatschemaConfig};

use super::{open_schema, require_confirmation};

/// Database lifecycle subcommands
#[derive(Subcommand)]
pub enum DatabaseCommands {
    /// Create the database if it does not exist
    Create {
        /// Database name, defaults to the configured database_name
        #[clap(value_name = "NAME")]
        name: Option<String>,
    },

    /// Drop the database and all its tables
    Drop {
        /// Confirm the irreversible drop
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Delete all rows from every installed table, keeping the structure
    Truncate {
        /// Confirm deleting all data
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

pub fn run(
    config: &StatschemaConfig,
    command: DatabaseCommands,
    output_format: OutputFormat,
) -> Result<()> {
    match command {
        DatabaseCommands::Create { name } => run_create(config, name, output_format),
        DatabaseCommands::Drop { yes } => run_drop(config, yes, output_format),
        DatabaseCommands::Truncate { yes } => run_truncate(config, yes, output_format),
    }
}

fn run_create(
    config: &StatschemaConfig,
    name: Option<String>,
    output_format: OutputFormat,
) -> Result<()> {
    let mut schema = SqliteSchema::new(config.clone());
    schema.create_database(name.as_deref())?;

    let path = schema
        .database_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    if output_format.is_json() {
        let value = json!({"database": schema.database_name(), "path": path});
        println!("{}", output_format.format_value(&value)?);
    } else {
        println!("Database '{}' ready at {}", schema.database_name(), path);
    }
    Ok(())
}

fn run_drop(config: &StatschemaConfig, yes: bool, output_format: OutputFormat) -> Result<()> {
    require_confirmation(yes, "drop the database")?;

    let mut schema = SqliteSchema::new(config.clone());
    schema.drop_database()?;

    if output_format.is_json() {
        let value = json!({"dropped": schema.database_name()});
        println!("{}", output_format.format_value(&value)?);
    } else {
        println!("Database '{}' dropped", schema.database_name());
    }
    Ok(())
}

fn run_truncate(config: &StatschemaConfig, yes: bool, output_format: OutputFormat) -> Result<()> {
    require_confirmation(yes, "truncate all tables")?;

    let schema = open_schema(config)?;
    schema.truncate_all_tables()?;
    let tables = schema.tables_installed(false)?;

    if output_format.is_json() {
        let value = json!({"truncated": tables});
        println!("{}", output_format.format_value(&value)?);
    } else {
        println!("Truncated {} tables", tables.len());
    }
    Ok(())
}
