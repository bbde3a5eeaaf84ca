//! Query-related data models.
//!
//! This module defines the tabular result type returned by every `run_sql` call.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One result row, keyed by column name.
pub type Record = serde_json::Map<String, JsonValue>;

/// Tabular result of a SQL statement.
///
/// Column order is preserved in `columns`; each row maps column name to a
/// JSON value. Duplicate column names keep the last value, as a map can only
/// hold one entry per key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl ResultSet {
    /// Create a result set from columns and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column by name, ignoring ASCII case. Returns the name as it
    /// appears in the result set.
    pub fn find_column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }
}

/// Read a column of a record as text.
///
/// NULL and missing columns read as an empty string; numbers and booleans are
/// rendered with their JSON representation.
pub fn record_text(record: &Record, column: &str) -> String {
    match record.get(column) {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
