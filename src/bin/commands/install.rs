use anyhow::Result;
use clap::Args;
use serde::Serialize;
use statschema::{OutputFormat, SchemaManager, SqliteSchema, StatschemaConfig};
use std::time::Instant;
use tracing::info;

/// Arguments for the Install command
#[derive(Args)]
pub struct InstallArgs {
    /// Database name, defaults to the configured database_name
    #[clap(long)]
    pub database: Option<String>,

    /// Version to record as install version, defaults to this build's version
    #[clap(long, value_name = "VERSION")]
    pub record_version: Option<String>,
}

#[derive(Debug, Serialize)]
struct InstallReport {
    database: String,
    tables_created: usize,
    tables_installed: usize,
    install_version: Option<String>,
    duration_secs: f64,
}

/// Create the database, all tables, the anonymous user and the install version
///
/// Every step is idempotent, so re-running on an installed database only fills gaps.
pub fn run(config: &StatschemaConfig, args: InstallArgs, output_format: OutputFormat) -> Result<()> {
    let InstallArgs {
        database,
        record_version,
    } = args;
    let start = Instant::now();

    let mut schema = SqliteSchema::new(config.clone());
    if let Some(version) = record_version {
        schema = schema.with_current_version(version);
    }

    schema.create_database(database.as_deref())?;
    let before = schema.tables_installed(true)?.len();

    schema.create_tables()?;
    schema.create_anonymous_user()?;
    schema.record_install_version()?;

    let installed = schema.tables_installed(true)?.len();
    let report = InstallReport {
        database: schema.database_name().to_string(),
        tables_created: installed.saturating_sub(before),
        tables_installed: installed,
        install_version: schema.install_version()?,
        duration_secs: start.elapsed().as_secs_f64(),
    };
    info!("Install finished in {:.2}s", report.duration_secs);

    if output_format.is_json() {
        println!("{}", output_format.format_value(&report)?);
    } else {
        println!("Database:          {}", report.database);
        println!("Tables created:    {}", report.tables_created);
        println!("Tables installed:  {}", report.tables_installed);
        println!(
            "Install version:   {}",
            report.install_version.as_deref().unwrap_or("-")
        );
        println!("Duration:          {:.2}s", report.duration_secs);
    }
    Ok(())
}
