use anyhow::Result;
use clap::Args;
use serde::Serialize;
use statschema::{
    ArchiveKind, ColumnDescriptor, OutputFormat, SchemaManager, SqliteSchema, StatschemaConfig,
};
use tabled::Tabled;

use super::open_schema;

/// Arguments for the Tables command
#[derive(Args)]
pub struct TablesArgs {
    /// List the tables installed in the database instead of the known table set
    #[clap(short, long)]
    pub installed: bool,
}

/// Arguments for the Columns command
#[derive(Args)]
pub struct ColumnsArgs {
    /// Full (prefixed) table name
    pub table: String,
}

/// Arguments for the CreateSql command
#[derive(Args)]
pub struct CreateSqlArgs {
    /// Table name, with or without prefix; all tables when omitted
    pub table: Option<String>,
}

/// Arguments for the Archive command
#[derive(Args)]
pub struct ArchiveArgs {
    /// Archive kind: numeric or blob
    pub kind: ArchiveKind,

    /// Year of the archived month
    pub year: i32,

    /// Month number, 1 to 12
    pub month: u32,
}

#[derive(Debug, Serialize, Tabled)]
struct TableRow {
    table: String,
    installed: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct ColumnRow {
    cid: i64,
    name: String,
    #[tabled(rename = "type")]
    #[serde(rename = "type")]
    data_type: String,
    nullable: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    default: String,
    primary_key: i64,
}

impl From<ColumnDescriptor> for ColumnRow {
    fn from(c: ColumnDescriptor) -> Self {
        ColumnRow {
            cid: c.cid,
            name: c.name,
            data_type: c.data_type,
            nullable: c.nullable,
            default: c.default.unwrap_or_default(),
            primary_key: c.primary_key,
        }
    }
}

pub fn run_tables(
    config: &StatschemaConfig,
    args: TablesArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let rows: Vec<TableRow> = if args.installed {
        open_schema(config)?
            .tables_installed(true)?
            .into_iter()
            .map(|table| TableRow {
                table,
                installed: true,
            })
            .collect()
    } else {
        // Known tables come from static definitions; mark installed ones when possible
        let installed = match SqliteSchema::connect(config.clone()) {
            Ok(schema) => schema.tables_installed(true)?,
            Err(_) => Default::default(),
        };
        SqliteSchema::new(config.clone())
            .tables_names()
            .into_iter()
            .map(|table| TableRow {
                installed: installed.contains(&table),
                table,
            })
            .collect()
    };

    println!("{}", output_format.format_rows(&rows)?);
    Ok(())
}

pub fn run_columns(
    config: &StatschemaConfig,
    args: ColumnsArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let schema = open_schema(config)?;
    let mut rows: Vec<ColumnRow> = schema
        .table_columns(&args.table)?
        .into_values()
        .map(ColumnRow::from)
        .collect();
    rows.sort_by_key(|row| row.cid);

    println!("{}", output_format.format_rows(&rows)?);
    Ok(())
}

pub fn run_create_sql(
    config: &StatschemaConfig,
    args: CreateSqlArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let schema = SqliteSchema::new(config.clone());
    let statements = match args.table {
        Some(table) => vec![schema.table_create_sql(&table)?],
        None => schema.tables_create_sql(),
    };

    if output_format.is_json() {
        println!("{}", output_format.format_value(&statements)?);
    } else {
        for sql in statements {
            println!("{};", sql);
        }
    }
    Ok(())
}

pub fn run_archive(
    config: &StatschemaConfig,
    args: ArchiveArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let schema = open_schema(config)?;
    let table = schema.create_archive_table(args.kind, args.year, args.month)?;

    if output_format.is_json() {
        let value = serde_json::json!({"kind": args.kind, "table": table});
        println!("{}", output_format.format_value(&value)?);
    } else {
        println!("Archive table {} ready", table);
    }
    Ok(())
}
