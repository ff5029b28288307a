#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Statschema - schema manager for a web analytics database
//!
//! Statschema owns the data-definition side of the analytics platform's
//! relational store: it creates and drops the database, creates the known
//! tables, introspects what is installed, and keeps the install metadata.
//! It can be used as both a command-line application and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Library: schema contract and SQLite adapter | `rusqlite`, `config` |
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | CLI binary | All above + `clap`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! statschema = { version = "0.3", default-features = false }
//!
//! # Default (CLI binary)
//! statschema = "0.3"
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: The [`SchemaManager`] contract and its SQLite adapter
//!   - `core`: connection wrapper, table definitions, errors, query hints
//!   - `sqlite`: [`SqliteSchema`], including monthly archive tables
//! - **[`config`]**: [`StatschemaConfig`], read once from TOML and environment
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use statschema::{SchemaManager, SqliteSchema, StatschemaConfig};
//!
//! let config = StatschemaConfig::new(&None)?;
//! let mut schema = SqliteSchema::new(config);
//!
//! // Fresh install
//! schema.create_database(None)?;
//! schema.create_tables()?;
//! schema.create_anonymous_user()?;
//! schema.record_install_version()?;
//!
//! // Introspection
//! for table in schema.tables_installed(false)? {
//!     println!("{}: {} columns", table, schema.table_columns(&table)?.len());
//! }
//!
//! // Advisory time limit for a report query
//! let sql = schema.add_max_execution_time_hint_to_query("SELECT * FROM matomo_log_visit", 5.0);
//! ```

pub mod config;
pub mod database;

#[cfg(feature = "display")]
pub mod utils;

// =============================================================================
// Configuration (always available)
// =============================================================================

pub use config::{format_size, StatschemaConfig};

// =============================================================================
// Database Module - Re-export commonly used types (always available)
// =============================================================================

pub use database::{
    ArchiveKind, ColumnDescriptor, DatabaseConn, HintDialect, SchemaDefinitions, SchemaError,
    SchemaManager, SchemaResult, SqliteSchema, TableDefinition,
};

#[cfg(feature = "display")]
pub use utils::OutputFormat;
