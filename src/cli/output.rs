//! Output formatting for CLI commands
//!
//! Structured results print as JSON or YAML; name/value listings can also
//! print as a plain table.

use anyhow::{Context, Result};
use serde::Serialize;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Table,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "table" => Ok(OutputFormat::Table),
            _ => anyhow::bail!(
                "Unsupported output format: '{}'. Use 'json', 'yaml', or 'table'.",
                s
            ),
        }
    }
}

/// Render `data` as JSON or YAML, or `rows` as a two-column table
pub fn render<T: Serialize>(
    data: &T,
    rows: &[(String, String)],
    columns: (&str, &str),
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(data).context("Failed to serialize to YAML"),
        OutputFormat::Table => Ok(render_table(columns, rows)),
    }
}

/// Print `data` in the requested format
pub fn print_output<T: Serialize>(
    data: &T,
    rows: &[(String, String)],
    columns: (&str, &str),
    format: OutputFormat,
) -> Result<()> {
    println!("{}", render(data, rows, columns, format)?.trim_end());
    Ok(())
}

fn render_table(columns: (&str, &str), rows: &[(String, String)]) -> String {
    let width = rows
        .iter()
        .map(|(key, _)| key.chars().count())
        .chain(std::iter::once(columns.0.len()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<width$}  {}\n", columns.0, columns.1, width = width);
    out.push_str(&"-".repeat(width + 2 + columns.1.len().max(8)));
    out.push('\n');
    for (key, value) in rows {
        out.push_str(&format!("{:<width$}  {}\n", key, value, width = width));
    }
    out
}
