//! Database connection management
//!
//! This module provides the SQLite connection wrapper the schema adapter issues its
//! statements through.

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use super::error::{SchemaError, SchemaResult};
use super::schema::quote_identifier;

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling.
pub struct DatabaseConn {
    pub conn: Connection,
    path: Option<PathBuf>,
}

impl DatabaseConn {
    /// Open (creating if needed) a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&Path>) -> SchemaResult<Self> {
        let conn = match path {
            Some(p) => Connection::open(p).map_err(|e| {
                SchemaError::DatabaseCreation(format!(
                    "Failed to open database at '{}': {}",
                    p.display(),
                    e
                ))
            })?,
            None => Connection::open_in_memory().map_err(|e| {
                SchemaError::Connection(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let db = DatabaseConn {
            conn,
            path: path.map(Path::to_path_buf),
        };
        db.configure()?;
        Ok(db)
    }

    /// Open an existing database file without creating it
    pub fn open_existing(path: &Path) -> SchemaResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            SchemaError::Connection(format!(
                "Failed to open database at '{}': {}",
                path.display(),
                e
            ))
        })?;

        let db = DatabaseConn {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.configure()?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> SchemaResult<Self> {
        Self::open(None)
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Configure the database with optimal settings
    ///
    /// Reading the journal mode is also the first real access to the file, so a
    /// path that is not a SQLite database fails here.
    fn configure(&self) -> SchemaResult<()> {
        // WAL for file databases; in-memory databases report "memory"
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| SchemaError::Connection(format!("Failed to set journal mode: {}", e)))?;

        self.conn
            .execute_batch(
                "PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )
            .map_err(|e| SchemaError::Connection(format!("Failed to configure database: {}", e)))?;

        Ok(())
    }

    /// Execute a SQL statement
    pub fn execute(&self, sql: &str) -> SchemaResult<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| SchemaError::database("Failed to execute SQL", e))
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> SchemaResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| SchemaError::database("Failed to check table existence", e))?;
        Ok(count > 0)
    }

    /// List the names of all user tables, sorted
    pub fn table_names(&self) -> SchemaResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type='table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .map_err(|e| SchemaError::database("Failed to list tables", e))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| SchemaError::database("Failed to list tables", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SchemaError::database("Failed to read table name", e))?;
        Ok(names)
    }

    /// Get the row count for a table
    pub fn table_count(&self, table_name: &str) -> SchemaResult<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", quote_identifier(table_name));
        let count: u64 = self
            .conn
            .query_row(&query, [], |row| row.get(0))
            .map_err(|e| SchemaError::database("Failed to get table count", e))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
        assert!(db.unwrap().path().is_none());
    }

    #[test]
    fn test_execute() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let result = db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_table_exists() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();

        assert!(db.table_exists("test_table").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }

    #[test]
    fn test_table_names_sorted() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE zeta (id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .unwrap();
        db.execute("CREATE TABLE alpha (id INTEGER)").unwrap();

        // sqlite_sequence is internal and must not show up
        assert_eq!(db.table_names().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_table_count() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();
        db.execute("INSERT INTO test_table (id) VALUES (1), (2), (3)")
            .unwrap();

        assert_eq!(db.table_count("test_table").unwrap(), 3);
    }

    #[test]
    fn test_table_count_quoted_name() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE \"odd\"\"name\" (id INTEGER)").unwrap();
        db.execute("INSERT INTO \"odd\"\"name\" (id) VALUES (1), (2)")
            .unwrap();

        assert_eq!(db.table_count("odd\"name").unwrap(), 2);
    }

    #[test]
    fn test_open_existing_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sqlite3");

        let result = DatabaseConn::open_existing(&path);
        assert!(matches!(result, Err(SchemaError::Connection(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_file_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.sqlite3");

        {
            let db = DatabaseConn::open(Some(path.as_path())).unwrap();
            db.execute("CREATE TABLE t (id INTEGER)").unwrap();
            assert_eq!(db.path(), Some(path.as_path()));
        }

        let db = DatabaseConn::open_existing(&path).unwrap();
        assert!(db.table_exists("t").unwrap());
    }
}
