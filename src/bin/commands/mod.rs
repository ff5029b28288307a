pub mod database;
pub mod hint;
pub mod install;
pub mod status;
pub mod tables;

use anyhow::{anyhow, Result};
use statschema::{SqliteSchema, StatschemaConfig};

/// Connect to the configured database, which must already exist
pub(crate) fn open_schema(config: &StatschemaConfig) -> Result<SqliteSchema> {
    SqliteSchema::connect(config.clone()).map_err(|e| {
        anyhow!(
            "{}\nRun `statschema install` or `statschema database create` first",
            e
        )
    })
}

/// Refuse destructive commands unless `--yes` was given
pub(crate) fn require_confirmation(yes: bool, action: &str) -> Result<()> {
    if yes {
        Ok(())
    } else {
        Err(anyhow!(
            "Refusing to {} without confirmation, re-run with --yes",
            action
        ))
    }
}
