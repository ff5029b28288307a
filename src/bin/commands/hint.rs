use anyhow::Result;
use clap::Args;
use serde_json::json;
use statschema::{HintDialect, OutputFormat, StatschemaConfig};

/// Arguments for the Hint command
#[derive(Args)]
pub struct HintArgs {
    /// SQL query to annotate
    pub sql: String,

    /// Time limit in seconds; 0 leaves the query unchanged
    #[clap(short, long, default_value_t = 0.0)]
    pub limit: f64,

    /// Hint dialect, overriding the configured one: mysql, mariadb, tidb, none
    #[clap(short, long)]
    pub dialect: Option<HintDialect>,
}

pub fn run(config: &StatschemaConfig, args: HintArgs, output_format: OutputFormat) -> Result<()> {
    let HintArgs {
        sql,
        limit,
        dialect,
    } = args;

    // Hints only rewrite text, no database connection is needed
    let dialect = dialect.unwrap_or(config.hint_dialect);
    let hinted = dialect.apply(&sql, limit);

    if output_format.is_json() {
        let value = json!({"dialect": dialect, "limit_secs": limit, "sql": hinted});
        println!("{}", output_format.format_value(&value)?);
    } else {
        println!("{}", hinted);
    }
    Ok(())
}
