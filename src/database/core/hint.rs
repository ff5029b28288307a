//! Execution-time query hints
//!
//! A hint advises the database server to abort a query after a time limit.
//! It is never enforced locally: the rewritten SQL is handed to the database
//! as-is, and engines that do not understand the hint treat it as a comment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SQL dialect used to express the execution-time hint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintDialect {
    /// `SELECT /*+ MAX_EXECUTION_TIME(ms) */ ...` optimizer comment
    #[default]
    Mysql,
    /// `SET STATEMENT max_statement_time=<secs> FOR ...` prefix
    Mariadb,
    /// Same optimizer comment as MySQL
    Tidb,
    /// Never add a hint
    None,
}

impl HintDialect {
    /// Rewrite `sql` to carry a time-limit hint when `limit_secs` is positive
    ///
    /// MySQL and TiDB insert ` /*+ MAX_EXECUTION_TIME(<ms>) */` right after the
    /// first `SELECT` keyword of the trimmed query, so removing that fragment
    /// gives back `sql.trim()`. The limit is truncated to milliseconds, with a
    /// minimum of 1. MariaDB prefixes `SET STATEMENT max_statement_time=<secs> FOR `
    /// with the limit rounded up to whole seconds.
    ///
    /// `sql` is returned unchanged when the limit is not positive, when it has
    /// no `SELECT` keyword outside literals and comments, or when it already
    /// carries this dialect's hint.
    pub fn apply(&self, sql: &str, limit_secs: f64) -> String {
        if !(limit_secs > 0.0) || self.is_hinted(sql) {
            return sql.to_string();
        }

        let query = sql.trim();
        let Some(pos) = find_select_keyword(query) else {
            return sql.to_string();
        };

        match self {
            HintDialect::Mysql | HintDialect::Tidb => {
                let end = pos + SELECT.len();
                let millis = ((limit_secs * 1000.0) as u64).max(1);
                format!(
                    "{} /*+ MAX_EXECUTION_TIME({}) */{}",
                    &query[..end],
                    millis,
                    &query[end..]
                )
            }
            HintDialect::Mariadb => format!(
                "SET STATEMENT max_statement_time={} FOR {}",
                limit_secs.ceil() as u64,
                query
            ),
            HintDialect::None => sql.to_string(),
        }
    }

    /// Whether `sql` already carries this dialect's time-limit hint
    fn is_hinted(&self, sql: &str) -> bool {
        match self {
            HintDialect::Mysql | HintDialect::Tidb => sql
                .to_ascii_uppercase()
                .contains("MAX_EXECUTION_TIME("),
            HintDialect::Mariadb => sql.to_ascii_lowercase().contains("max_statement_time"),
            HintDialect::None => true,
        }
    }

    pub fn all_names() -> &'static [&'static str] {
        &["mysql", "mariadb", "tidb", "none"]
    }
}

const SELECT: &str = "SELECT";

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Byte offset of the first `SELECT` keyword
///
/// Only whole words count; quoted literals, quoted identifiers and comments
/// are skipped.
fn find_select_keyword(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !bytes[i..].starts_with(b"*/") {
                    i += 1;
                }
                i += 2;
            }
            b if is_word_byte(b) => {
                let start = i;
                while i < bytes.len() && is_word_byte(bytes[i]) {
                    i += 1;
                }
                if bytes[start..i].eq_ignore_ascii_case(SELECT.as_bytes()) {
                    return Some(start);
                }
            }
            _ => i += 1,
        }
    }
    None
}

impl fmt::Display for HintDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mysql => write!(f, "mysql"),
            Self::Mariadb => write!(f, "mariadb"),
            Self::Tidb => write!(f, "tidb"),
            Self::None => write!(f, "none"),
        }
    }
}

impl FromStr for HintDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(Self::Mysql),
            "mariadb" => Ok(Self::Mariadb),
            "tidb" => Ok(Self::Tidb),
            "none" | "off" => Ok(Self::None),
            _ => Err(format!(
                "Unknown hint dialect '{}'. Valid dialects: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}
