//! Table definitions for the analytics schema
//!
//! All tables the platform installs are declared here, in creation order.
//! Names carry no prefix; the prefix is applied when statements are rendered.

use super::schema::TableDefinition;

/// Column definitions shared by the monthly numeric and blob archive tables
const ARCHIVE_COLUMNS: &str = r#"
    idarchive INTEGER NOT NULL,
    name VARCHAR(190) NOT NULL,
    idsite INTEGER NULL,
    date1 DATE NULL,
    date2 DATE NULL,
    period INTEGER NULL,
    ts_archived DATETIME NULL,
    "#;

/// Schema definitions for all tables of the analytics database
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// Prefix of the monthly numeric archive tables
    pub const ARCHIVE_NUMERIC_PREFIX: &'static str = "archive_numeric_";

    /// Prefix of the monthly blob archive tables
    pub const ARCHIVE_BLOB_PREFIX: &'static str = "archive_blob_";

    /// Table holding the users, including the anonymous user
    pub const USER_TABLE: &'static str = "user";

    /// Key/value option table, holding the install version among others
    pub const OPTION_TABLE: &'static str = "option";

    /// The known table set, in declaration order
    pub const TABLES: &'static [TableDefinition] = &[
        TableDefinition {
            name: "user",
            definition: r#"
                login VARCHAR(100) NOT NULL PRIMARY KEY,
                password VARCHAR(255) NOT NULL,
                email VARCHAR(100) NOT NULL,
                twofactor_secret VARCHAR(40) NOT NULL DEFAULT '',
                superuser_access INTEGER NOT NULL DEFAULT 0,
                date_registered DATETIME NULL,
                ts_password_modified DATETIME NULL,
                idchange_last_viewed INTEGER NULL,
                invited_by VARCHAR(100) NULL,
                invite_token VARCHAR(191) NULL,
                invite_link_token VARCHAR(191) NULL,
                invite_expired_at DATETIME NULL,
                invite_accept_at DATETIME NULL
            "#,
        },
        TableDefinition {
            name: "twofactor_recovery_code",
            definition: r#"
                idrecoverycode INTEGER PRIMARY KEY AUTOINCREMENT,
                login VARCHAR(100) NOT NULL,
                recovery_code VARCHAR(40) NOT NULL
            "#,
        },
        TableDefinition {
            name: "user_token_auth",
            definition: r#"
                idusertokenauth INTEGER PRIMARY KEY AUTOINCREMENT,
                login VARCHAR(100) NOT NULL,
                description VARCHAR(100) NOT NULL,
                password VARCHAR(191) NOT NULL UNIQUE,
                hash_algo VARCHAR(30) NOT NULL,
                system_token INTEGER NOT NULL DEFAULT 0,
                last_used DATETIME NULL,
                date_created DATETIME NOT NULL,
                date_expired DATETIME NULL,
                secure_only INTEGER NOT NULL DEFAULT 0
            "#,
        },
        TableDefinition {
            name: "access",
            definition: r#"
                idaccess INTEGER PRIMARY KEY AUTOINCREMENT,
                login VARCHAR(100) NOT NULL,
                idsite INTEGER NOT NULL,
                access VARCHAR(50) NULL
            "#,
        },
        TableDefinition {
            name: "site",
            definition: r#"
                idsite INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(90) NOT NULL,
                main_url VARCHAR(255) NOT NULL,
                ts_created DATETIME NULL,
                ecommerce INTEGER DEFAULT 0,
                sitesearch INTEGER DEFAULT 1,
                sitesearch_keyword_parameters TEXT NOT NULL DEFAULT '',
                sitesearch_category_parameters TEXT NOT NULL DEFAULT '',
                timezone VARCHAR(50) NOT NULL,
                currency CHAR(3) NOT NULL,
                exclude_unknown_urls INTEGER DEFAULT 0,
                excluded_ips TEXT NOT NULL DEFAULT '',
                excluded_parameters TEXT NOT NULL DEFAULT '',
                excluded_user_agents TEXT NOT NULL DEFAULT '',
                excluded_referrers TEXT NOT NULL DEFAULT '',
                "group" VARCHAR(250) NOT NULL DEFAULT '',
                type VARCHAR(255) NOT NULL DEFAULT 'website',
                keep_url_fragment INTEGER NOT NULL DEFAULT 0,
                creator_login VARCHAR(100) NULL
            "#,
        },
        TableDefinition {
            name: "plugin_setting",
            definition: r#"
                idplugin_setting INTEGER PRIMARY KEY AUTOINCREMENT,
                plugin_name VARCHAR(60) NOT NULL,
                setting_name VARCHAR(255) NOT NULL,
                setting_value TEXT NOT NULL,
                json_encoded INTEGER NOT NULL DEFAULT 0,
                user_login VARCHAR(100) NOT NULL DEFAULT ''
            "#,
        },
        TableDefinition {
            name: "site_setting",
            definition: r#"
                idsite_setting INTEGER PRIMARY KEY AUTOINCREMENT,
                idsite INTEGER NOT NULL,
                plugin_name VARCHAR(60) NOT NULL,
                setting_name VARCHAR(255) NOT NULL,
                setting_value TEXT NOT NULL,
                json_encoded INTEGER NOT NULL DEFAULT 0
            "#,
        },
        TableDefinition {
            name: "site_url",
            definition: r#"
                idsite INTEGER NOT NULL,
                url VARCHAR(190) NOT NULL,
                PRIMARY KEY (idsite, url)
            "#,
        },
        TableDefinition {
            name: "goal",
            definition: r#"
                idsite INTEGER NOT NULL,
                idgoal INTEGER NOT NULL,
                name VARCHAR(50) NOT NULL,
                description VARCHAR(255) NOT NULL DEFAULT '',
                match_attribute VARCHAR(20) NOT NULL,
                pattern VARCHAR(255) NOT NULL,
                pattern_type VARCHAR(25) NOT NULL,
                case_sensitive INTEGER NOT NULL,
                allow_multiple INTEGER NOT NULL,
                revenue REAL NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0,
                use_event_value INTEGER NOT NULL DEFAULT 0,
                event_value_as_revenue INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (idsite, idgoal)
            "#,
        },
        TableDefinition {
            name: "logger_message",
            definition: r#"
                idlogger_message INTEGER PRIMARY KEY AUTOINCREMENT,
                tag VARCHAR(50) NULL,
                timestamp DATETIME NULL,
                level VARCHAR(16) NULL,
                message TEXT NULL
            "#,
        },
        TableDefinition {
            name: "log_action",
            definition: r#"
                idaction INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(4096),
                hash INTEGER NOT NULL,
                type INTEGER NULL,
                url_prefix INTEGER NULL
            "#,
        },
        TableDefinition {
            name: "log_visit",
            definition: r#"
                idvisit INTEGER PRIMARY KEY AUTOINCREMENT,
                idsite INTEGER NOT NULL,
                idvisitor BLOB NOT NULL,
                visit_last_action_time DATETIME NOT NULL,
                config_id BLOB NOT NULL,
                location_ip BLOB NOT NULL,
                visit_first_action_time DATETIME NOT NULL,
                visit_total_actions INTEGER NULL,
                visit_total_time INTEGER NULL,
                visitor_returning INTEGER NULL,
                user_id VARCHAR(200) NULL,
                referer_type INTEGER NULL,
                referer_name VARCHAR(255) NULL,
                referer_url TEXT NULL,
                location_country CHAR(3) NULL
            "#,
        },
        TableDefinition {
            name: "log_conversion_item",
            definition: r#"
                idsite INTEGER NOT NULL,
                idvisitor BLOB NOT NULL,
                server_time DATETIME NOT NULL,
                idvisit INTEGER NOT NULL,
                idorder VARCHAR(100) NOT NULL,
                idaction_sku INTEGER NOT NULL,
                idaction_name INTEGER NOT NULL,
                idaction_category INTEGER NOT NULL,
                price REAL NOT NULL,
                quantity INTEGER NOT NULL,
                deleted INTEGER NOT NULL,
                PRIMARY KEY (idvisit, idorder, idaction_sku)
            "#,
        },
        TableDefinition {
            name: "log_conversion",
            definition: r#"
                idvisit INTEGER NOT NULL,
                idsite INTEGER NOT NULL,
                idvisitor BLOB NOT NULL,
                server_time DATETIME NOT NULL,
                idaction_url INTEGER DEFAULT NULL,
                idlink_va INTEGER DEFAULT NULL,
                idgoal INTEGER NOT NULL,
                buster INTEGER NOT NULL,
                idorder VARCHAR(100) DEFAULT NULL,
                items INTEGER DEFAULT NULL,
                url VARCHAR(4096) NOT NULL,
                revenue REAL DEFAULT NULL,
                PRIMARY KEY (idvisit, idgoal, buster),
                UNIQUE (idsite, idorder)
            "#,
        },
        TableDefinition {
            name: "log_link_visit_action",
            definition: r#"
                idlink_va INTEGER PRIMARY KEY AUTOINCREMENT,
                idsite INTEGER NOT NULL,
                idvisitor BLOB NOT NULL,
                idvisit INTEGER NOT NULL,
                idaction_url_ref INTEGER NULL DEFAULT 0,
                idaction_name_ref INTEGER NULL,
                server_time DATETIME NOT NULL,
                idpageview CHAR(6) NULL DEFAULT NULL,
                pageview_position INTEGER NULL DEFAULT NULL,
                time_spent INTEGER NULL
            "#,
        },
        TableDefinition {
            name: "log_profiling",
            definition: r#"
                idprofiling INTEGER PRIMARY KEY AUTOINCREMENT,
                query TEXT NOT NULL UNIQUE,
                count INTEGER NULL,
                sum_time_ms REAL NULL
            "#,
        },
        TableDefinition {
            name: "option",
            definition: r#"
                option_name VARCHAR(191) NOT NULL PRIMARY KEY,
                option_value TEXT NOT NULL,
                autoload INTEGER NOT NULL DEFAULT 1
            "#,
        },
        TableDefinition {
            name: "session",
            definition: r#"
                id VARCHAR(191) NOT NULL PRIMARY KEY,
                modified INTEGER,
                lifetime INTEGER,
                data BLOB
            "#,
        },
        TableDefinition {
            name: "archive_invalidations",
            definition: r#"
                idinvalidation INTEGER PRIMARY KEY AUTOINCREMENT,
                idarchive INTEGER NULL,
                name VARCHAR(255) NOT NULL,
                idsite INTEGER NOT NULL,
                date1 DATE NOT NULL,
                date2 DATE NOT NULL,
                period INTEGER NOT NULL,
                ts_invalidated DATETIME NULL,
                ts_started DATETIME NULL,
                status INTEGER DEFAULT 0,
                "report" VARCHAR(255) NULL
            "#,
        },
        TableDefinition {
            name: "sequence",
            definition: r#"
                name VARCHAR(120) NOT NULL PRIMARY KEY,
                value INTEGER NOT NULL
            "#,
        },
        TableDefinition {
            name: "brute_force_log",
            definition: r#"
                id_brute_force_log INTEGER PRIMARY KEY AUTOINCREMENT,
                ip_address VARCHAR(60) DEFAULT NULL,
                attempted_at DATETIME NOT NULL,
                login VARCHAR(100) NULL
            "#,
        },
        TableDefinition {
            name: "tracking_failure",
            definition: r#"
                idsite INTEGER NOT NULL,
                idfailure INTEGER NOT NULL,
                date_first_occurred DATETIME NOT NULL,
                request_url TEXT NOT NULL,
                PRIMARY KEY (idsite, idfailure)
            "#,
        },
        TableDefinition {
            name: "locks",
            definition: r#"
                key VARCHAR(70) NOT NULL PRIMARY KEY,
                value VARCHAR(255) NULL DEFAULT NULL,
                expiry_time INTEGER DEFAULT 9999999999
            "#,
        },
        TableDefinition {
            name: "changes",
            definition: r#"
                idchange INTEGER PRIMARY KEY AUTOINCREMENT,
                created_time DATETIME NOT NULL,
                plugin_name VARCHAR(60) NOT NULL,
                version VARCHAR(20) NOT NULL,
                title VARCHAR(255) NOT NULL,
                description TEXT NULL,
                link_name VARCHAR(255) NULL,
                link VARCHAR(255) NULL,
                UNIQUE (plugin_name, version)
            "#,
        },
        TableDefinition {
            name: "user_dashboard",
            definition: r#"
                login VARCHAR(100) NOT NULL,
                iddashboard INTEGER NOT NULL,
                name VARCHAR(100) NULL DEFAULT NULL,
                layout TEXT NOT NULL,
                PRIMARY KEY (login, iddashboard)
            "#,
        },
        TableDefinition {
            name: "user_language",
            definition: r#"
                login VARCHAR(100) NOT NULL PRIMARY KEY,
                language VARCHAR(10) NOT NULL,
                use_12_hour_clock INTEGER NOT NULL DEFAULT 0
            "#,
        },
        TableDefinition {
            name: "segment",
            definition: r#"
                idsegment INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) NOT NULL,
                definition TEXT NOT NULL,
                hash CHAR(32) NULL,
                login VARCHAR(100) NOT NULL,
                enable_all_users INTEGER NOT NULL DEFAULT 0,
                enable_only_idsite INTEGER DEFAULT 0,
                auto_archive INTEGER NOT NULL DEFAULT 0,
                ts_created DATETIME NULL,
                ts_last_edit DATETIME NULL,
                deleted INTEGER NOT NULL DEFAULT 0
            "#,
        },
    ];

    /// Column definitions of a numeric archive table
    pub fn archive_numeric_definition() -> String {
        format!(
            "{}value REAL NULL,\n    PRIMARY KEY (idarchive, name)",
            ARCHIVE_COLUMNS
        )
    }

    /// Column definitions of a blob archive table
    pub fn archive_blob_definition() -> String {
        format!(
            "{}value BLOB NULL,\n    PRIMARY KEY (idarchive, name)",
            ARCHIVE_COLUMNS
        )
    }

    /// Whether an unprefixed table name is a monthly archive table
    pub fn is_archive_table(name: &str) -> bool {
        name.starts_with(Self::ARCHIVE_NUMERIC_PREFIX) || name.starts_with(Self::ARCHIVE_BLOB_PREFIX)
    }

    /// Column definition for an unprefixed `archive_<kind>_YYYY_MM` table name
    pub fn archive_definition(name: &str) -> Option<String> {
        let (definition, month) = if let Some(month) = name.strip_prefix(Self::ARCHIVE_NUMERIC_PREFIX) {
            (Self::archive_numeric_definition(), month)
        } else if let Some(month) = name.strip_prefix(Self::ARCHIVE_BLOB_PREFIX) {
            (Self::archive_blob_definition(), month)
        } else {
            return None;
        };

        let mut parts = month.split('_');
        let valid = match (parts.next(), parts.next(), parts.next()) {
            (Some(year), Some(month), None) => {
                year.len() == 4
                    && month.len() == 2
                    && year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit())
                    && matches!(month.parse::<u32>(), Ok(1..=12))
            }
            _ => false,
        };
        valid.then_some(definition)
    }
}
