//! Database module
//!
//! This module provides all database functionality for statschema, organized into:
//!
//! - **core**: The schema management contract and shared infrastructure
//! - **sqlite**: The SQLite adapter implementing the contract
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/             # Foundation
//! │   ├── connection    # SQLite DatabaseConn wrapper
//! │   ├── definitions   # Known table set of the analytics schema
//! │   ├── error         # SchemaError
//! │   ├── hint          # Execution-time hint dialects
//! │   └── schema        # SchemaManager trait and value types
//! │
//! └── sqlite/           # SQLite adapter
//!     └── archive       # Monthly archive tables
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use statschema::database::{SchemaManager, SqliteSchema};
//! use statschema::StatschemaConfig;
//!
//! let config = StatschemaConfig::new(&None)?;
//! let mut schema = SqliteSchema::new(config);
//!
//! schema.create_database(None)?;
//! schema.create_tables()?;
//! schema.create_anonymous_user()?;
//! schema.record_install_version()?;
//!
//! assert!(schema.has_tables()?);
//! ```

pub mod core;
pub mod sqlite;

pub use core::{
    create_table_sql, quote_identifier, validate_identifier, ColumnDescriptor, DatabaseConn,
    HintDialect, SchemaDefinitions, SchemaError, SchemaManager, SchemaResult, TableDefinition,
    ANONYMOUS_USER, OPTION_INSTALL_VERSION,
};
pub use sqlite::{ArchiveKind, SqliteSchema};
