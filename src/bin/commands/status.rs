use anyhow::Result;
use serde::Serialize;
use statschema::{format_size, OutputFormat, SchemaManager, SqliteSchema, StatschemaConfig};

#[derive(Debug, Serialize)]
struct DatabaseStatus {
    database: String,
    path: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    tables_known: usize,
    tables_installed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tables_missing: Vec<String>,
    archive_tables: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    install_version: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConfigInfo<'a> {
    config_file: String,
    #[serde(flatten)]
    config: &'a StatschemaConfig,
}

pub fn run_status(config: &StatschemaConfig, output_format: OutputFormat) -> Result<()> {
    let path = config.default_database_path();
    let exists = path.is_file();

    let mut status = DatabaseStatus {
        database: config.database_name.clone(),
        path: path.display().to_string(),
        exists,
        size_bytes: None,
        tables_known: SqliteSchema::new(config.clone()).tables_names().len(),
        tables_installed: 0,
        tables_missing: Vec::new(),
        archive_tables: 0,
        install_version: None,
    };

    if exists {
        status.size_bytes = std::fs::metadata(&path).ok().map(|m| m.len());

        let schema = SqliteSchema::connect(config.clone())?;
        let installed = schema.tables_installed(true)?;
        status.archive_tables = schema.archive_tables()?.len();
        status.tables_installed = installed.len() - status.archive_tables;
        status.tables_missing = schema
            .tables_names()
            .into_iter()
            .filter(|name| !installed.contains(name))
            .collect();
        status.install_version = schema.install_version()?;
    }

    if output_format.is_json() {
        println!("{}", output_format.format_value(&status)?);
        return Ok(());
    }

    println!("Statschema Database Status");
    println!("==========================\n");
    println!("  Database:         {}", status.database);
    println!("  Path:             {}", status.path);
    println!(
        "  Status:           {}",
        if status.exists { "exists" } else { "not created" }
    );
    if let Some(size) = status.size_bytes {
        println!("  Size:             {}", format_size(size));
    }
    println!(
        "  Tables:           {} of {} installed",
        status.tables_installed, status.tables_known
    );
    println!("  Archive tables:   {}", status.archive_tables);
    println!(
        "  Install version:  {}",
        status.install_version.as_deref().unwrap_or("not recorded")
    );
    if !status.tables_missing.is_empty() {
        println!("  Missing tables:   {}", status.tables_missing.join(", "));
    }

    if !status.exists {
        eprintln!();
        eprintln!("Run `statschema install` to create the database and its tables");
    }
    Ok(())
}

pub fn run_config(config: &StatschemaConfig, output_format: OutputFormat) -> Result<()> {
    if output_format.is_json() {
        let info = ConfigInfo {
            config_file: StatschemaConfig::config_file_path(),
            config,
        };
        println!("{}", output_format.format_value(&info)?);
    } else {
        println!("Config File:        {}", StatschemaConfig::config_file_path());
        println!("{}", config.summary());
    }
    Ok(())
}
