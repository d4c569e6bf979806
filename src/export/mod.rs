//! CSV serialization of the filtered table.
//!
//! Writes a header row of column names followed by one line per row,
//! with no synthetic row index. An existing file at the destination is
//! overwritten without confirmation. Write failure is the one error in
//! the pipeline that is allowed to terminate the process.

use crate::table::ResultTable;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Writes the table to `path` as UTF-8 CSV.
pub fn write_csv(table: &ResultTable, path: &Path) -> Result<()> {
    // Every column is pruned when no row survives filtering; truncate
    // the destination to an empty file rather than hand the csv writer
    // a zero-field record.
    if table.columns().is_empty() {
        std::fs::File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        info!("No rows survived filtering; wrote empty {}", path.display());
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;

    writer
        .write_record(table.columns())
        .context("Failed to write CSV header")?;

    for row in table.rows() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|column| row.get(column).map(render_cell).unwrap_or_default())
            .collect();
        writer
            .write_record(&cells)
            .context("Failed to write CSV row")?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Renders a JSON value as CSV cell text.
///
/// Strings are written raw (the csv writer quotes as needed); numbers
/// and booleans use their display form; nested arrays and objects are
/// written as compact JSON text.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        nested => nested.to_string(),
    }
}
