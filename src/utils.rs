//! Output formatting shared by the CLI commands
//!
//! Rows are any type that derives both `Tabled` and `Serialize`, so the same
//! data renders as a table, markdown, JSON or pipe-separated values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Unified output format for all commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty table with borders (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON (single line)
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
    /// JSON Lines format (one JSON object per line)
    JsonLine,
    /// Pipe-separated values with header
    Psv,
}

impl OutputFormat {
    /// Check if this is a JSON variant
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    /// Get a list of all format names for help text
    pub fn all_names() -> &'static [&'static str] {
        &[
            "table",
            "markdown",
            "json",
            "json-pretty",
            "json-line",
            "psv",
        ]
    }

    /// Render rows in this format
    pub fn format_rows<T>(&self, rows: &[T]) -> Result<String, serde_json::Error>
    where
        T: Tabled + Serialize,
    {
        let out = match self {
            Self::Table => Table::new(rows).with(Style::rounded()).to_string(),
            Self::Markdown => Table::new(rows).with(Style::markdown()).to_string(),
            Self::Json => serde_json::to_string(rows)?,
            Self::JsonPretty => serde_json::to_string_pretty(rows)?,
            Self::JsonLine => rows
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?
                .join("\n"),
            Self::Psv => {
                let header = T::headers().iter().map(|h| h.to_string()).collect::<Vec<_>>();
                let mut lines = vec![header.join("|")];
                lines.extend(rows.iter().map(|row| {
                    row.fields()
                        .iter()
                        .map(|f| f.to_string())
                        .collect::<Vec<_>>()
                        .join("|")
                }));
                lines.join("\n")
            }
        };
        Ok(out)
    }

    /// Render a single serializable value; tables fall back to pretty JSON
    pub fn format_value<T: Serialize>(&self, value: &T) -> Result<String, serde_json::Error> {
        match self {
            Self::Json | Self::JsonLine => serde_json::to_string(value),
            _ => serde_json::to_string_pretty(value),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::JsonLine => write!(f, "json-line"),
            Self::Psv => write!(f, "psv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            "psv" | "pipe" => Ok(Self::Psv),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        table: String,
        rows: u64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                table: "matomo_site".to_string(),
                rows: 2,
            },
            Row {
                table: "matomo_user".to_string(),
                rows: 1,
            },
        ]
    }

    #[test]
    fn test_from_str() {
        assert_eq!("md".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert_eq!("JSONL".parse::<OutputFormat>(), Ok(OutputFormat::JsonLine));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_display_roundtrip_names() {
        for name in OutputFormat::all_names() {
            let format: OutputFormat = name.parse().unwrap();
            assert_eq!(&format.to_string(), name);
        }
    }

    #[test]
    fn test_format_psv() {
        let out = OutputFormat::Psv.format_rows(&rows()).unwrap();
        assert_eq!(out, "table|rows\nmatomo_site|2\nmatomo_user|1");
    }

    #[test]
    fn test_format_json_line() {
        let out = OutputFormat::JsonLine.format_rows(&rows()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"table":"matomo_site","rows":2}"#);
    }

    #[test]
    fn test_format_table_contains_values() {
        let out = OutputFormat::Table.format_rows(&rows()).unwrap();
        assert!(out.contains("matomo_site"));
        assert!(out.contains("rows"));
    }
}
