//! Schema manager errors

/// Result type returned by all [`SchemaManager`](super::SchemaManager) operations
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Errors that can occur while managing the database schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Referenced table is not part of the known table set, or does not exist
    UnknownTable(String),
    /// A table with this name is already installed
    TableAlreadyExists(String),
    /// Database could not be created (insufficient privilege or name conflict)
    DatabaseCreation(String),
    /// Database is unreachable or no database is connected
    Connection(String),
    /// Table name, database name or prefix contains characters outside `[A-Za-z0-9_]`
    InvalidName(String),
    /// Any other failure reported by the database or its files
    Database(String),
}

impl SchemaError {
    /// Wrap a driver error with a short description of what was attempted
    pub(crate) fn database(context: &str, err: impl std::fmt::Display) -> Self {
        SchemaError::Database(format!("{}: {}", context, err))
    }
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::UnknownTable(name) => write!(f, "Unknown table '{}'", name),
            SchemaError::TableAlreadyExists(name) => {
                write!(f, "Table '{}' already exists", name)
            }
            SchemaError::DatabaseCreation(e) => write!(f, "Database creation error: {}", e),
            SchemaError::Connection(e) => write!(f, "Connection error: {}", e),
            SchemaError::InvalidName(name) => write!(f, "Invalid identifier '{}'", name),
            SchemaError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SchemaError {}
