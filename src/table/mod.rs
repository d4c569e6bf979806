//! Tabulation and row filtering.
//!
//! Turns the ordered fetch records into a sparse, row-oriented table
//! over the union of all observed field names, then applies the two
//! cleaning rules: drop rows missing any data column, drop rows
//! carrying a non-empty error message.
//!
//! Union-of-columns semantics carry a deliberate quirk: a row from a
//! small payload is dropped when another payload introduced columns it
//! doesn't have, so rows from structurally different endpoints
//! frequently eliminate each other. That behavior is intended and
//! covered by tests; do not "fix" it here.

use crate::models::{FetchRecord, ERROR_COLUMN};
use serde_json::Value;
use std::collections::HashMap;

/// A sparse row: column name to value, missing columns absent.
pub type Row = HashMap<String, Value>;

/// Row-oriented view of all fetch results.
///
/// Columns are ordered by first appearance across the records; rows
/// keep the input record order. Before filtering, the row count
/// equals the number of fetch records.
#[derive(Debug, Clone)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultTable {
    /// Builds the table from the ordered fetch records.
    ///
    /// The column set is the union of keys across all records; failure
    /// records contribute the single error-message column. A field
    /// whose value is an explicit JSON null still contributes its
    /// column but leaves the cell absent, so null counts as a missing
    /// value during filtering.
    pub fn from_records(records: &[FetchRecord]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<Row> = Vec::with_capacity(records.len());

        for record in records {
            let mut row = Row::new();
            for name in record.field_names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
                match record.field(name) {
                    Some(value) if !value.is_null() => {
                        row.insert(name.to_string(), value);
                    }
                    _ => {}
                }
            }
            rows.push(row);
        }

        Self { columns, rows }
    }

    /// Applies the cleaning rules, in order:
    ///
    /// 1. Drop any row missing a value in a data column (every union
    ///    column except the error column; counting the error column
    ///    would eliminate every successful row as soon as a single
    ///    fetch failed).
    /// 2. Drop any row carrying a non-empty error value.
    ///
    /// Columns left without a value in any surviving row (in practice
    /// only the error column) are pruned afterwards, so the output
    /// contains no all-empty column.
    pub fn retain_complete(&mut self) {
        let data_columns: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.as_str() != ERROR_COLUMN)
            .cloned()
            .collect();

        self.rows.retain(|row| {
            let complete = data_columns.iter().all(|c| row.contains_key(c));
            let errored = row
                .get(ERROR_COLUMN)
                .is_some_and(|value| !value_is_empty(value));
            complete && !errored
        });

        let rows = &self.rows;
        self.columns
            .retain(|column| rows.iter().any(|row| row.contains_key(column)));
    }

    /// Column names, in first-appearance order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The (possibly filtered) rows, in input order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows currently in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Whether a value counts as "no error": null or an empty string.
fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FetchError, FetchRecord};
    use serde_json::json;

    fn success(url: &str, value: serde_json::Value) -> FetchRecord {
        FetchRecord::success(url, value.as_object().unwrap().clone())
    }

    fn failure(url: &str, status: u16) -> FetchRecord {
        FetchRecord::failure(
            url,
            FetchError::Status {
                url: url.to_string(),
                status,
            },
        )
    }

    #[test]
    fn test_row_count_matches_record_count_before_filtering() {
        let records = vec![
            success("https://a", json!({"id": 1})),
            failure("https://b", 404),
            success("https://c", json!({"id": 2})),
        ];
        let table = ResultTable::from_records(&records);
        assert_eq!(table.len(), records.len());
    }

    #[test]
    fn test_column_union_includes_error_column() {
        let records = vec![
            success("https://a", json!({"id": 1, "name": "a"})),
            failure("https://b", 404),
        ];
        let table = ResultTable::from_records(&records);
        assert_eq!(table.columns(), &["id", "name", ERROR_COLUMN]);
    }

    #[test]
    fn test_filtering_keeps_complete_rows_and_drops_errors() {
        let records = vec![
            success("https://a", json!({"id": 1, "name": "a"})),
            failure("https://b", 404),
            success("https://c", json!({"id": 2, "name": "b"})),
        ];
        let mut table = ResultTable::from_records(&records);
        table.retain_complete();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].get("id"), Some(&json!(1)));
        assert_eq!(table.rows()[0].get("name"), Some(&json!("a")));
        assert_eq!(table.rows()[1].get("id"), Some(&json!(2)));
        assert_eq!(table.rows()[1].get("name"), Some(&json!("b")));
        // The error column held no surviving value and is pruned.
        assert_eq!(table.columns(), &["id", "name"]);
    }

    #[test]
    fn test_union_quirk_drops_rows_missing_a_later_column() {
        // {"id":1} has no "extra", so the union rule eliminates it.
        let records = vec![
            success("https://a", json!({"id": 1})),
            success("https://b", json!({"extra": "y", "id": 2})),
        ];
        let mut table = ResultTable::from_records(&records);
        table.retain_complete();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("id"), Some(&json!(2)));
        assert_eq!(table.rows()[0].get("extra"), Some(&json!("y")));
    }

    #[test]
    fn test_null_valued_field_counts_as_missing() {
        let records = vec![
            success("https://a", json!({"id": null, "name": "a"})),
            success("https://b", json!({"id": 2, "name": "b"})),
        ];
        let mut table = ResultTable::from_records(&records);
        assert_eq!(table.columns(), &["id", "name"]);

        table.retain_complete();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("id"), Some(&json!(2)));
    }

    #[test]
    fn test_all_failures_filter_to_empty_table() {
        let records = vec![failure("https://a", 500), failure("https://b", 503)];
        let mut table = ResultTable::from_records(&records);
        table.retain_complete();
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_error_value_does_not_drop_a_row() {
        // A payload may legitimately carry an empty "error" field.
        let records = vec![success("https://a", json!({"error": "", "id": 1}))];
        let mut table = ResultTable::from_records(&records);
        table.retain_complete();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_columns_follow_first_appearance_order() {
        let records = vec![
            success("https://a", json!({"id": 1, "name": "a"})),
            success("https://b", json!({"extra": "y", "id": 2, "name": "b"})),
        ];
        let table = ResultTable::from_records(&records);
        // serde_json objects iterate in sorted key order, so "extra"
        // still first-appears via the second record.
        assert_eq!(table.columns(), &["id", "name", "extra"]);
    }
}
