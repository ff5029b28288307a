//! SQLite schema adapter
//!
//! `SqliteSchema` implements [`SchemaManager`] on top of a single SQLite
//! database, stored as `<data_dir>/<database_name>.sqlite3` or kept in memory.
//!
//! Policies:
//! - `create_table` on an installed table fails with `TableAlreadyExists`.
//! - `create_database` on an existing database file opens it.
//! - After `drop_database`, every operation that needs the database fails with
//!   `SchemaError::Connection` until `create_database` is called again.
//! - The installed-table cache belongs to the instance and is only refreshed
//!   when asked for (`force_reload = true` or `invalidate_tables_cache`).
//! - The connection sits behind a mutex, so a `&SqliteSchema` can be shared
//!   across threads. Statements are serialized on that connection.

mod archive;

pub use archive::ArchiveKind;

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::config::StatschemaConfig;
use crate::database::core::{
    create_table_sql, quote_identifier, validate_identifier, ColumnDescriptor, DatabaseConn,
    SchemaDefinitions, SchemaError, SchemaManager, SchemaResult, TableDefinition, ANONYMOUS_USER,
    OPTION_INSTALL_VERSION,
};

/// Email stored on the anonymous user row
const ANONYMOUS_EMAIL: &str = "anonymous@example.org";

/// Schema manager for an SQLite database
pub struct SqliteSchema {
    config: StatschemaConfig,
    db: Mutex<Option<DatabaseConn>>,
    database_name: String,
    in_memory: bool,
    current_version: String,
    tables_installed: Mutex<Option<BTreeSet<String>>>,
}

impl SqliteSchema {
    /// Create a schema manager that is not connected to any database yet
    ///
    /// Call [`SchemaManager::create_database`] to create or open the database.
    pub fn new(config: StatschemaConfig) -> Self {
        Self {
            database_name: config.database_name.clone(),
            config,
            db: Mutex::new(None),
            in_memory: false,
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            tables_installed: Mutex::new(None),
        }
    }

    /// Connect to the configured database, which must already exist
    pub fn connect(config: StatschemaConfig) -> SchemaResult<Self> {
        let mut schema = Self::new(config);
        let path = schema.config.default_database_path();
        *schema.db_mut() = Some(DatabaseConn::open_existing(&path)?);
        debug!("Connected to database at {}", path.display());
        Ok(schema)
    }

    /// Create a schema manager backed by a fresh in-memory database
    pub fn open_in_memory(config: StatschemaConfig) -> SchemaResult<Self> {
        let mut schema = Self::new(config);
        schema.in_memory = true;
        *schema.db_mut() = Some(DatabaseConn::open_in_memory()?);
        Ok(schema)
    }

    /// Set the software version recorded by `record_install_version`
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    /// The version `record_install_version` would record
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Name of the database this instance manages
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.in_memory {
            None
        } else {
            Some(self.config.database_path(&self.database_name))
        }
    }

    /// Whether a database connection is currently open
    pub fn is_connected(&self) -> bool {
        self.db_lock().is_some()
    }

    pub fn config(&self) -> &StatschemaConfig {
        &self.config
    }

    /// Forget the cached installed-table set
    pub fn invalidate_tables_cache(&self) {
        *self.cache() = None;
    }

    /// Drop every installed table except the ones named in `keep`
    ///
    /// Names in `keep` are full, prefixed table names. Returns the dropped names.
    pub fn drop_tables(&self, keep: &[&str]) -> SchemaResult<Vec<String>> {
        let tables = self.tables_installed(true)?;

        let dropped = self.with_conn(|db| {
            let mut dropped = Vec::new();
            for table in tables {
                if keep.contains(&table.as_str()) {
                    continue;
                }
                db.execute(&format!("DROP TABLE {}", quote_identifier(&table)))?;
                debug!("Dropped table {}", table);
                dropped.push(table);
            }
            Ok(dropped)
        })?;

        info!("Dropped {} tables", dropped.len());
        Ok(dropped)
    }

    /// Row count of an installed table
    pub fn table_row_count(&self, table_name: &str) -> SchemaResult<u64> {
        self.with_conn(|db| {
            if !db.table_exists(table_name)? {
                return Err(SchemaError::UnknownTable(table_name.to_string()));
            }
            db.table_count(table_name)
        })
    }

    /// Run `f` on the open connection, holding its lock for the duration
    ///
    /// Lock order is cache before connection: `f` must not touch the cache.
    fn with_conn<T>(&self, f: impl FnOnce(&DatabaseConn) -> SchemaResult<T>) -> SchemaResult<T> {
        let guard = self.db_lock();
        match guard.as_ref() {
            Some(db) => f(db),
            None => Err(SchemaError::Connection(format!(
                "No connection to database '{}'",
                self.database_name
            ))),
        }
    }

    // A panic inside a statement leaves the connection itself usable, so
    // poisoned locks are recovered rather than propagated.
    fn db_lock(&self) -> MutexGuard<'_, Option<DatabaseConn>> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn db_mut(&mut self) -> &mut Option<DatabaseConn> {
        self.db
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cache(&self) -> MutexGuard<'_, Option<BTreeSet<String>>> {
        self.tables_installed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prefixed(&self, name: &str) -> String {
        format!("{}{}", self.config.table_prefix, name)
    }

    /// Prefixed name of a table that must be installed
    fn installed_table(&self, name: &str) -> SchemaResult<String> {
        let table = self.prefixed(name);
        if self.with_conn(|db| db.table_exists(&table))? {
            Ok(table)
        } else {
            Err(SchemaError::UnknownTable(table))
        }
    }

    /// Whether a live table name belongs to this schema
    fn is_schema_table(&self, table: &str) -> bool {
        match table.strip_prefix(self.config.table_prefix.as_str()) {
            Some(name) => {
                self.known_table(name).is_some() || SchemaDefinitions::is_archive_table(name)
            }
            None => false,
        }
    }
}

impl SchemaManager for SqliteSchema {
    fn create_table(&self, name_without_prefix: &str, create_definition: &str) -> SchemaResult<()> {
        validate_identifier(name_without_prefix, false)?;
        let table = self.prefixed(name_without_prefix);

        self.with_conn(|db| {
            if db.table_exists(&table)? {
                return Err(SchemaError::TableAlreadyExists(table.clone()));
            }

            db.conn
                .execute(&create_table_sql(&table, create_definition), [])
                .map_err(|e| match e.to_string() {
                    msg if msg.contains("already exists") => {
                        SchemaError::TableAlreadyExists(table.clone())
                    }
                    msg => {
                        SchemaError::Database(format!("Failed to create table {}: {}", table, msg))
                    }
                })?;
            Ok(())
        })?;

        debug!("Created table {}", table);
        Ok(())
    }

    fn create_database(&mut self, name: Option<&str>) -> SchemaResult<()> {
        let name = name.unwrap_or(&self.config.database_name).to_string();
        validate_identifier(&name, false)?;

        if self.in_memory {
            if self.db_mut().is_none() {
                *self.db_mut() = Some(DatabaseConn::open_in_memory()?);
            }
            self.database_name = name;
            return Ok(());
        }

        let path = self.config.database_path(&name);
        if let Some(db) = self.db_mut().as_ref() {
            if db.path() == Some(path.as_path()) {
                return Ok(());
            }
        }

        if path.is_dir() {
            return Err(SchemaError::DatabaseCreation(format!(
                "'{}' exists and is not a database file",
                path.display()
            )));
        }

        std::fs::create_dir_all(&self.config.data_dir).map_err(|e| {
            SchemaError::DatabaseCreation(format!(
                "Unable to create data directory '{}': {}",
                self.config.data_dir, e
            ))
        })?;

        let existed = path.exists();
        let db = DatabaseConn::open(Some(path.as_path())).map_err(|e| match e {
            SchemaError::DatabaseCreation(msg) => SchemaError::DatabaseCreation(msg),
            other => SchemaError::DatabaseCreation(format!(
                "Unable to use '{}' as database: {}",
                path.display(),
                other
            )),
        })?;

        if existed {
            info!("Opened existing database {} at {}", name, path.display());
        } else {
            info!("Created database {} at {}", name, path.display());
        }

        *self.db_mut() = Some(db);
        self.database_name = name;
        self.invalidate_tables_cache();
        Ok(())
    }

    fn drop_database(&mut self) -> SchemaResult<()> {
        let path = self.database_path();

        // Close the connection before removing the files
        *self.db_mut() = None;
        self.invalidate_tables_cache();

        match path {
            Some(path) => {
                for file in database_files(&path) {
                    match std::fs::remove_file(&file) {
                        Ok(()) => debug!("Removed {}", file.display()),
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => {
                            return Err(SchemaError::database(
                                &format!("Failed to remove {}", file.display()),
                                e,
                            ))
                        }
                    }
                }
                info!("Dropped database {} at {}", self.database_name, path.display());
            }
            None => info!("Dropped in-memory database {}", self.database_name),
        }

        Ok(())
    }

    fn create_tables(&self) -> SchemaResult<()> {
        let installed = self.tables_installed(true)?;

        let created = self.with_conn(|db| {
            let mut created = 0;
            for table in self.table_definitions() {
                let name = self.prefixed(table.name);
                if installed.contains(&name) {
                    debug!("Table {} already installed, skipping", name);
                    continue;
                }
                db.conn
                    .execute(&table.create_sql(&self.config.table_prefix), [])
                    .map_err(|e| {
                        SchemaError::database(&format!("Failed to create table {}", name), e)
                    })?;
                created += 1;
            }
            Ok(created)
        })?;

        info!(
            "Created {} of {} tables",
            created,
            self.table_definitions().len()
        );
        Ok(())
    }

    fn create_anonymous_user(&self) -> SchemaResult<()> {
        let table = self.installed_table(SchemaDefinitions::USER_TABLE)?;
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let inserted = self.with_conn(|db| {
            db.conn
                .execute(
                    &format!(
                        "INSERT OR IGNORE INTO {} (login, password, email, superuser_access, date_registered, ts_password_modified)
                         VALUES (?1, '', ?2, 0, ?3, ?3)",
                        quote_identifier(&table)
                    ),
                    [ANONYMOUS_USER, ANONYMOUS_EMAIL, now.as_str()],
                )
                .map_err(|e| SchemaError::database("Failed to create anonymous user", e))
        })?;

        if inserted > 0 {
            info!("Created anonymous user");
        } else {
            debug!("Anonymous user already exists");
        }
        Ok(())
    }

    fn record_install_version(&self) -> SchemaResult<()> {
        let table = self.installed_table(SchemaDefinitions::OPTION_TABLE)?;

        let inserted = self.with_conn(|db| {
            db.conn
                .execute(
                    &format!(
                        "INSERT OR IGNORE INTO {} (option_name, option_value, autoload) VALUES (?1, ?2, 0)",
                        quote_identifier(&table)
                    ),
                    [OPTION_INSTALL_VERSION, self.current_version.as_str()],
                )
                .map_err(|e| SchemaError::database("Failed to record install version", e))
        })?;

        if inserted > 0 {
            info!("Recorded install version {}", self.current_version);
        } else {
            debug!("Install version already recorded");
        }
        Ok(())
    }

    fn install_version(&self) -> SchemaResult<Option<String>> {
        let table = self.prefixed(SchemaDefinitions::OPTION_TABLE);

        self.with_conn(|db| {
            if !db.table_exists(&table)? {
                return Ok(None);
            }

            let result = db.conn.query_row(
                &format!(
                    "SELECT option_value FROM {} WHERE option_name = ?1",
                    quote_identifier(&table)
                ),
                [OPTION_INSTALL_VERSION],
                |row| row.get(0),
            );

            match result {
                Ok(version) => Ok(Some(version)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(SchemaError::database("Failed to read install version", e)),
            }
        })
    }

    fn truncate_all_tables(&self) -> SchemaResult<()> {
        let tables = self.tables_installed(true)?;

        self.with_conn(|db| {
            let has_sequence = db.table_exists("sqlite_sequence")?;
            let tx = db
                .conn
                .unchecked_transaction()
                .map_err(|e| SchemaError::database("Failed to begin transaction", e))?;

            for table in &tables {
                tx.execute(&format!("DELETE FROM {}", quote_identifier(table)), [])
                    .map_err(|e| {
                        SchemaError::database(&format!("Failed to truncate {}", table), e)
                    })?;
                if has_sequence {
                    tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1", [table])
                        .map_err(|e| SchemaError::database("Failed to reset sequence", e))?;
                }
            }

            tx.commit()
                .map_err(|e| SchemaError::database("Failed to commit truncation", e))
        })?;

        info!("Truncated {} tables", tables.len());
        Ok(())
    }

    fn tables_installed(&self, force_reload: bool) -> SchemaResult<BTreeSet<String>> {
        let mut cache = self.cache();
        if !force_reload {
            if let Some(tables) = cache.as_ref() {
                return Ok(tables.clone());
            }
        }

        let tables: BTreeSet<String> = self
            .with_conn(|db| db.table_names())?
            .into_iter()
            .filter(|name| self.is_schema_table(name))
            .collect();

        *cache = Some(tables.clone());
        Ok(tables)
    }

    fn table_columns(&self, table_name: &str) -> SchemaResult<BTreeMap<String, ColumnDescriptor>> {
        let columns = self.with_conn(|db| {
            let mut stmt = db
                .conn
                .prepare(
                    r#"SELECT cid, name, type, "notnull", dflt_value, pk
                       FROM pragma_table_info(?1)"#,
                )
                .map_err(|e| SchemaError::database("Failed to read table columns", e))?;

            let columns = stmt
                .query_map([table_name], |row| {
                    Ok(ColumnDescriptor {
                        cid: row.get(0)?,
                        name: row.get(1)?,
                        data_type: row.get(2)?,
                        nullable: row.get::<_, i64>(3)? == 0,
                        default: row.get(4)?,
                        primary_key: row.get(5)?,
                    })
                })
                .map_err(|e| SchemaError::database("Failed to read table columns", e))?
                .map(|column| column.map(|c| (c.name.clone(), c)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map_err(|e| SchemaError::database("Failed to read column", e))?;
            Ok(columns)
        })?;

        if columns.is_empty() {
            return Err(SchemaError::UnknownTable(table_name.to_string()));
        }
        Ok(columns)
    }

    fn add_max_execution_time_hint_to_query(&self, sql: &str, limit_secs: f64) -> String {
        self.config.hint_dialect.apply(sql, limit_secs)
    }

    fn table_prefix(&self) -> &str {
        &self.config.table_prefix
    }

    fn table_definitions(&self) -> &'static [TableDefinition] {
        SchemaDefinitions::TABLES
    }
}

/// The database file and the WAL side files SQLite keeps next to it
fn database_files(path: &Path) -> [PathBuf; 3] {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    [path.to_path_buf(), with_suffix("-wal"), with_suffix("-shm")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::HintDialect;

    fn test_config(data_dir: &Path) -> StatschemaConfig {
        StatschemaConfig {
            data_dir: data_dir.to_string_lossy().to_string(),
            database_name: "analytics".to_string(),
            table_prefix: "matomo_".to_string(),
            hint_dialect: HintDialect::Mysql,
        }
    }

    fn memory_schema() -> SqliteSchema {
        SqliteSchema::open_in_memory(test_config(Path::new("/unused"))).unwrap()
    }

    #[test]
    fn test_table_create_sql_known_tables() {
        let schema = memory_schema();
        for name in schema.tables_names() {
            let sql = schema.table_create_sql(&name).unwrap();
            assert!(!sql.is_empty());
            assert!(sql.contains(&name), "{} missing from {}", name, sql);
        }
        // unprefixed lookup gives the same statement
        assert_eq!(
            schema.table_create_sql("log_visit").unwrap(),
            schema.table_create_sql("matomo_log_visit").unwrap()
        );
    }

    #[test]
    fn test_table_create_sql_archive_table() {
        let schema = memory_schema();
        let table = schema
            .create_archive_table(ArchiveKind::Numeric, 2024, 1)
            .unwrap();

        let sql = schema.table_create_sql("archive_numeric_2024_01").unwrap();
        assert!(sql.starts_with("CREATE TABLE \"matomo_archive_numeric_2024_01\""));
        assert_eq!(schema.table_create_sql(&table).unwrap(), sql);
        assert_eq!(
            sql,
            create_table_sql(&table, &SchemaDefinitions::archive_numeric_definition())
        );
        assert!(schema.table_create_sql("archive_blob_2024_13").is_err());
    }

    #[test]
    fn test_table_create_sql_unknown_table() {
        let schema = memory_schema();
        assert_eq!(
            schema.table_create_sql("visits"),
            Err(SchemaError::UnknownTable("visits".to_string()))
        );
    }

    #[test]
    fn test_tables_create_sql_order() {
        let schema = memory_schema();
        let statements = schema.tables_create_sql();
        assert_eq!(statements.len(), SchemaDefinitions::TABLES.len());
        assert!(statements[0].starts_with("CREATE TABLE \"matomo_user\""));
    }

    #[test]
    fn test_tables_names_without_database() {
        let schema = SqliteSchema::new(test_config(Path::new("/nonexistent")));
        let names = schema.tables_names();
        assert_eq!(names.len(), SchemaDefinitions::TABLES.len());
        assert!(names.iter().all(|n| n.starts_with("matomo_")));
        assert!(!schema.is_connected());
    }

    #[test]
    fn test_create_table() {
        let schema = memory_schema();
        schema
            .create_table("custom_report", "id INTEGER PRIMARY KEY, label TEXT NOT NULL")
            .unwrap();

        assert!(schema
            .tables_installed(true)
            .unwrap()
            .is_empty(), "custom tables are not part of the schema set");
        let columns = schema.table_columns("matomo_custom_report").unwrap();
        assert_eq!(columns.len(), 2);
        assert!(!columns["label"].nullable);
    }

    #[test]
    fn test_create_table_already_exists() {
        let schema = memory_schema();
        schema.create_table("site", "idsite INTEGER").unwrap();

        assert_eq!(
            schema.create_table("site", "idsite INTEGER"),
            Err(SchemaError::TableAlreadyExists("matomo_site".to_string()))
        );
    }

    #[test]
    fn test_create_table_invalid_name() {
        let schema = memory_schema();
        assert!(matches!(
            schema.create_table("bad name", "id INTEGER"),
            Err(SchemaError::InvalidName(_))
        ));
    }

    #[test]
    fn test_create_tables_idempotent() {
        let schema = memory_schema();
        schema.create_tables().unwrap();
        let first = schema.tables_installed(true).unwrap();

        schema.create_tables().unwrap();
        let second = schema.tables_installed(true).unwrap();

        assert_eq!(first, second);
        let expected: BTreeSet<String> = schema.tables_names().into_iter().collect();
        assert_eq!(first, expected);
    }

    #[test]
    fn test_create_tables_fills_gaps() {
        let schema = memory_schema();
        let site = schema.known_table("site").unwrap();
        schema.create_table(site.name, site.definition).unwrap();

        schema.create_tables().unwrap();
        assert_eq!(
            schema.tables_installed(true).unwrap().len(),
            SchemaDefinitions::TABLES.len()
        );
    }

    #[test]
    fn test_install_version_absent() {
        let schema = memory_schema();
        assert_eq!(schema.install_version().unwrap(), None);

        schema.create_tables().unwrap();
        assert_eq!(schema.install_version().unwrap(), None);
    }

    #[test]
    fn test_record_install_version_once() {
        let schema = memory_schema().with_current_version("4.15.0");
        schema.create_tables().unwrap();
        schema.record_install_version().unwrap();

        let schema = schema.with_current_version("5.0.0");
        schema.record_install_version().unwrap();

        assert_eq!(schema.install_version().unwrap(), Some("4.15.0".to_string()));
    }

    #[test]
    fn test_record_install_version_requires_tables() {
        let schema = memory_schema();
        assert_eq!(
            schema.record_install_version(),
            Err(SchemaError::UnknownTable("matomo_option".to_string()))
        );
    }

    #[test]
    fn test_create_anonymous_user() {
        let schema = memory_schema();
        schema.create_tables().unwrap();

        schema.create_anonymous_user().unwrap();
        schema.create_anonymous_user().unwrap();

        assert_eq!(schema.table_row_count("matomo_user").unwrap(), 1);
        let login: String = schema
            .with_conn(|db| {
                Ok(db
                    .conn
                    .query_row("SELECT login FROM matomo_user", [], |row| row.get(0))
                    .unwrap())
            })
            .unwrap();
        assert_eq!(login, ANONYMOUS_USER);
    }

    #[test]
    fn test_tables_installed_cache() {
        let schema = memory_schema();
        assert!(schema.tables_installed(true).unwrap().is_empty());

        schema.create_tables().unwrap();

        // create_tables itself reloads the set before creating
        assert!(schema.tables_installed(false).unwrap().is_empty());
        assert_eq!(
            schema.tables_installed(true).unwrap().len(),
            SchemaDefinitions::TABLES.len()
        );

        schema.drop_tables(&[]).unwrap();
        assert_eq!(
            schema.tables_installed(false).unwrap().len(),
            SchemaDefinitions::TABLES.len()
        );
        schema.invalidate_tables_cache();
        assert!(schema.tables_installed(false).unwrap().is_empty());
    }

    #[test]
    fn test_tables_installed_ignores_foreign_tables() {
        let schema = memory_schema();
        schema.create_tables().unwrap();
        schema
            .with_conn(|db| {
                db.execute("CREATE TABLE other_app (id INTEGER)")?;
                db.execute("CREATE TABLE matomo_unrelated (id INTEGER)")
            })
            .unwrap();

        let installed = schema.tables_installed(true).unwrap();
        assert!(!installed.contains("other_app"));
        assert!(!installed.contains("matomo_unrelated"));
    }

    #[test]
    fn test_table_columns() {
        let schema = memory_schema();
        schema.create_tables().unwrap();

        let columns = schema.table_columns("matomo_option").unwrap();
        let names: Vec<_> = columns.keys().cloned().collect();
        assert_eq!(names, vec!["autoload", "option_name", "option_value"]);

        let autoload = &columns["autoload"];
        assert_eq!(autoload.data_type, "INTEGER");
        assert!(!autoload.nullable);
        assert_eq!(autoload.default.as_deref(), Some("1"));
        assert_eq!(columns["option_name"].primary_key, 1);
        assert_eq!(columns["option_name"].cid, 0);
    }

    #[test]
    fn test_table_columns_unknown_table() {
        let schema = memory_schema();
        assert_eq!(
            schema.table_columns("matomo_nothing"),
            Err(SchemaError::UnknownTable("matomo_nothing".to_string()))
        );
    }

    #[test]
    fn test_truncate_all_tables() {
        let schema = memory_schema();
        schema.create_tables().unwrap();
        schema.create_anonymous_user().unwrap();
        schema.record_install_version().unwrap();

        schema.truncate_all_tables().unwrap();

        assert_eq!(schema.table_row_count("matomo_user").unwrap(), 0);
        assert_eq!(schema.table_row_count("matomo_option").unwrap(), 0);
        assert_eq!(schema.install_version().unwrap(), None);
        assert_eq!(
            schema.tables_installed(true).unwrap().len(),
            SchemaDefinitions::TABLES.len()
        );
    }

    #[test]
    fn test_drop_tables_keeps_named() {
        let schema = memory_schema();
        schema.create_tables().unwrap();

        let dropped = schema.drop_tables(&["matomo_option"]).unwrap();
        assert_eq!(dropped.len(), SchemaDefinitions::TABLES.len() - 1);

        let installed = schema.tables_installed(true).unwrap();
        assert_eq!(installed.into_iter().collect::<Vec<_>>(), vec!["matomo_option"]);
    }

    #[test]
    fn test_has_tables() {
        let schema = memory_schema();
        assert!(!schema.has_tables().unwrap());
        schema.create_tables().unwrap();
        assert!(schema.has_tables().unwrap());
    }

    #[test]
    fn test_hint() {
        let schema = memory_schema();
        let sql = "SELECT * FROM matomo_log_visit";
        assert_eq!(schema.add_max_execution_time_hint_to_query(sql, 0.0), sql);

        let hinted = schema.add_max_execution_time_hint_to_query(sql, 5.0);
        assert_eq!(hinted, "SELECT /*+ MAX_EXECUTION_TIME(5000) */ * FROM matomo_log_visit");
        assert_eq!(
            hinted.replacen(" /*+ MAX_EXECUTION_TIME(5000) */", "", 1),
            sql.trim()
        );
        assert_eq!(schema.add_max_execution_time_hint_to_query(&hinted, 5.0), hinted);
    }

    #[test]
    fn test_hint_follows_configured_dialect() {
        let mut config = test_config(Path::new("/unused"));
        config.hint_dialect = HintDialect::Mariadb;
        let schema = SqliteSchema::new(config);

        assert_eq!(
            schema.add_max_execution_time_hint_to_query(" SELECT 1", 1.2),
            "SET STATEMENT max_statement_time=2 FOR SELECT 1"
        );
        assert_eq!(
            schema.add_max_execution_time_hint_to_query("UPDATE t SET selected = 1", 1.2),
            "UPDATE t SET selected = 1"
        );
    }

    #[test]
    fn test_hinted_query_runs_on_sqlite() {
        let schema = memory_schema();
        schema.create_tables().unwrap();
        let sql = schema.add_max_execution_time_hint_to_query("SELECT COUNT(*) FROM matomo_site", 2.5);

        let count: i64 = schema
            .with_conn(|db| Ok(db.conn.query_row(&sql, [], |row| row.get(0)).unwrap()))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_schema_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<SqliteSchema>();
    }

    #[test]
    fn test_parallel_reads() {
        let schema = memory_schema();
        schema.create_tables().unwrap();
        let expected = schema.tables_names().len();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        for _ in 0..10 {
                            assert_eq!(schema.tables_names().len(), expected);
                            assert!(schema.has_tables().unwrap());
                            let columns = schema.table_columns("matomo_option").unwrap();
                            assert_eq!(columns.len(), 3);
                            assert_eq!(schema.tables_installed(false).unwrap().len(), expected);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    }

    #[test]
    fn test_disconnected_operations_fail() {
        let schema = SqliteSchema::new(test_config(Path::new("/nonexistent")));
        assert!(matches!(schema.has_tables(), Err(SchemaError::Connection(_))));
        assert!(matches!(schema.create_tables(), Err(SchemaError::Connection(_))));
        assert!(matches!(
            schema.install_version(),
            Err(SchemaError::Connection(_))
        ));
    }

    #[test]
    fn test_connect_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteSchema::connect(test_config(dir.path()));
        assert!(matches!(result, Err(SchemaError::Connection(_))));
    }

    #[test]
    fn test_create_database_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut schema = SqliteSchema::new(test_config(dir.path()));

        schema.create_database(None).unwrap();
        assert!(schema.is_connected());
        assert_eq!(schema.database_name(), "analytics");
        assert!(dir.path().join("analytics.sqlite3").exists());

        // reconnecting to an existing database works through connect()
        schema.create_tables().unwrap();
        let other = SqliteSchema::connect(test_config(dir.path())).unwrap();
        assert!(other.has_tables().unwrap());
    }

    #[test]
    fn test_create_database_named_and_existing() {
        let dir = tempfile::tempdir().unwrap();
        let mut schema = SqliteSchema::new(test_config(dir.path()));

        schema.create_database(Some("staging")).unwrap();
        schema.create_tables().unwrap();
        assert_eq!(
            schema.database_path(),
            Some(dir.path().join("staging.sqlite3"))
        );

        // opening an existing database keeps its tables
        let mut again = SqliteSchema::new(test_config(dir.path()));
        again.create_database(Some("staging")).unwrap();
        assert!(again.has_tables().unwrap());
    }

    #[test]
    fn test_create_database_name_conflict() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("analytics.sqlite3")).unwrap();
        std::fs::write(
            dir.path().join("notes.sqlite3"),
            "plain text, not a database\n".repeat(400),
        )
        .unwrap();

        let mut schema = SqliteSchema::new(test_config(dir.path()));
        assert!(matches!(
            schema.create_database(None),
            Err(SchemaError::DatabaseCreation(_))
        ));
        assert!(matches!(
            schema.create_database(Some("notes")),
            Err(SchemaError::DatabaseCreation(_))
        ));
        assert!(!schema.is_connected());
    }

    #[test]
    fn test_create_database_invalid_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut schema = SqliteSchema::new(test_config(dir.path()));
        assert!(matches!(
            schema.create_database(Some("../escape")),
            Err(SchemaError::InvalidName(_))
        ));
    }

    #[test]
    fn test_drop_database_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut schema = SqliteSchema::new(test_config(dir.path()));
        schema.create_database(None).unwrap();
        schema.create_tables().unwrap();

        schema.drop_database().unwrap();

        assert!(!dir.path().join("analytics.sqlite3").exists());
        assert!(!dir.path().join("analytics.sqlite3-wal").exists());
        assert!(!schema.is_connected());
        assert!(matches!(schema.has_tables(), Err(SchemaError::Connection(_))));

        // the database can be created again afterwards
        schema.create_database(None).unwrap();
        assert!(!schema.has_tables().unwrap());
    }

    #[test]
    fn test_drop_in_memory_database() {
        let mut schema = memory_schema();
        schema.create_tables().unwrap();
        schema.drop_database().unwrap();
        assert!(matches!(schema.has_tables(), Err(SchemaError::Connection(_))));

        schema.create_database(None).unwrap();
        assert!(!schema.has_tables().unwrap());
    }

    #[test]
    fn test_database_files() {
        let files = database_files(Path::new("/data/analytics.sqlite3"));
        assert_eq!(files[1], PathBuf::from("/data/analytics.sqlite3-wal"));
        assert_eq!(files[2], PathBuf::from("/data/analytics.sqlite3-shm"));
    }
}
