//! Core database infrastructure
//!
//! This module provides the foundational components every schema adapter builds on:
//! - `DatabaseConn`: Core SQLite connection wrapper with configuration
//! - `SchemaManager`: The schema management contract
//! - `SchemaDefinitions`: The known table set of the analytics schema
//! - `SchemaError`: Typed errors shared by all adapters
//! - `HintDialect`: Execution-time hint rewriting

mod connection;
mod definitions;
mod error;
mod hint;
mod schema;

pub use connection::DatabaseConn;
pub use definitions::SchemaDefinitions;
pub use error::{SchemaError, SchemaResult};
pub use hint::HintDialect;
pub use schema::{
    create_table_sql, quote_identifier, validate_identifier, ColumnDescriptor, SchemaManager,
    TableDefinition, ANONYMOUS_USER, OPTION_INSTALL_VERSION,
};
