use clap::{Parser, Subcommand};
use statschema::*;
use tracing::Level;

mod commands;

use commands::database::DatabaseCommands;
use commands::hint::HintArgs;
use commands::install::InstallArgs;
use commands::tables::{ArchiveArgs, ColumnsArgs, CreateSqlArgs, TablesArgs};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.statschema/statschema.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, json-line, psv
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show database and schema status
    Status,

    /// Show the active configuration
    Config,

    /// Create the database, all tables, the anonymous user and the install version
    Install(InstallArgs),

    /// Database lifecycle: create, drop, truncate
    Database {
        #[clap(subcommand)]
        command: DatabaseCommands,
    },

    /// List known or installed tables
    Tables(TablesArgs),

    /// Show the live columns of a table
    Columns(ColumnsArgs),

    /// Print CREATE TABLE statements
    CreateSql(CreateSqlArgs),

    /// Create a monthly archive table
    Archive(ArchiveArgs),

    /// Add a max execution time hint to a query
    Hint(HintArgs),
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match StatschemaConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let output_format = cli.format;
    let result = match cli.command {
        Commands::Status => commands::status::run_status(&config, output_format),
        Commands::Config => commands::status::run_config(&config, output_format),
        Commands::Install(args) => commands::install::run(&config, args, output_format),
        Commands::Database { command } => commands::database::run(&config, command, output_format),
        Commands::Tables(args) => commands::tables::run_tables(&config, args, output_format),
        Commands::Columns(args) => commands::tables::run_columns(&config, args, output_format),
        Commands::CreateSql(args) => {
            commands::tables::run_create_sql(&config, args, output_format)
        }
        Commands::Archive(args) => commands::tables::run_archive(&config, args, output_format),
        Commands::Hint(args) => commands::hint::run(&config, args, output_format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
