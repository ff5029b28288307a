use statschema::{HintDialect, SchemaError, SchemaManager, SqliteSchema, StatschemaConfig};
use std::collections::BTreeSet;

fn config(data_dir: &std::path::Path) -> StatschemaConfig {
    StatschemaConfig {
        data_dir: data_dir.to_string_lossy().to_string(),
        database_name: "analytics".to_string(),
        table_prefix: "matomo_".to_string(),
        hint_dialect: HintDialect::Mysql,
    }
}

/// Scenario run against any adapter whose database has been created
fn check_install_cycle<S: SchemaManager>(schema: &S) {
    assert_eq!(schema.install_version().unwrap(), None);

    schema.create_tables().unwrap();
    assert!(schema.has_tables().unwrap());

    let expected: BTreeSet<String> = schema.tables_names().into_iter().collect();
    assert_eq!(schema.tables_installed(true).unwrap(), expected);

    schema.create_anonymous_user().unwrap();
    schema.create_anonymous_user().unwrap();
    schema.record_install_version().unwrap();
    assert!(schema.install_version().unwrap().is_some());

    schema.truncate_all_tables().unwrap();
    assert_eq!(schema.tables_installed(true).unwrap(), expected);
    assert_eq!(schema.install_version().unwrap(), None);
}

#[test]
fn test_file_database_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut schema = SqliteSchema::new(config(dir.path())).with_current_version("5.1.0");

    schema.create_database(None).unwrap();
    check_install_cycle(&schema);

    schema.drop_database().unwrap();
    assert!(!dir.path().join("analytics.sqlite3").exists());
    assert!(matches!(
        schema.has_tables(),
        Err(SchemaError::Connection(_))
    ));
}

#[test]
fn test_in_memory_lifecycle() {
    let mut schema = SqliteSchema::open_in_memory(config(std::path::Path::new("/unused"))).unwrap();
    check_install_cycle(&schema);

    schema.drop_database().unwrap();
    assert!(schema.has_tables().is_err());
}

#[test]
fn test_install_version_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut schema = SqliteSchema::new(config(dir.path())).with_current_version("4.0.0");
        schema.create_database(None).unwrap();
        schema.create_tables().unwrap();
        schema.record_install_version().unwrap();
    }

    let schema = SqliteSchema::connect(config(dir.path()))
        .unwrap()
        .with_current_version("5.0.0");
    schema.record_install_version().unwrap();
    assert_eq!(schema.install_version().unwrap(), Some("4.0.0".to_string()));
}

#[test]
fn test_create_table_sql_for_every_known_table() {
    let schema = SqliteSchema::new(config(std::path::Path::new("/unused")));
    let names = schema.tables_names();
    let statements = schema.tables_create_sql();
    assert_eq!(names.len(), statements.len());

    for (name, sql) in names.iter().zip(&statements) {
        assert_eq!(&schema.table_create_sql(name).unwrap(), sql);
        assert!(sql.contains(&format!("\"{}\"", name)));
    }
}

#[test]
fn test_execution_hint_through_trait() {
    let schema = SqliteSchema::new(config(std::path::Path::new("/unused")));
    let sql = "SELECT idsite FROM matomo_site";

    assert_eq!(schema.add_max_execution_time_hint_to_query(sql, 0.0), sql);

    let hinted = schema.add_max_execution_time_hint_to_query(sql, 5.0);
    assert_ne!(hinted, sql);
    assert_eq!(
        hinted.replacen(" /*+ MAX_EXECUTION_TIME(5000) */", "", 1),
        sql.trim()
    );

    // already hinted or not a SELECT: left alone
    assert_eq!(schema.add_max_execution_time_hint_to_query(&hinted, 5.0), hinted);
    let update = "UPDATE matomo_site SET selected = 1";
    assert_eq!(schema.add_max_execution_time_hint_to_query(update, 5.0), update);
}

#[test]
fn test_schema_shared_between_threads() {
    let dir = tempfile::tempdir().unwrap();
    let mut schema = SqliteSchema::new(config(dir.path()));
    schema.create_database(None).unwrap();
    schema.create_tables().unwrap();
    let schema = &schema;

    std::thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(move || {
                assert!(schema.has_tables().unwrap());
                assert!(schema.table_columns("matomo_site").unwrap().contains_key("idsite"));
            });
        }
    });
}
