//! Row snapshots and primary-key tuples used by the row comparator.

use std::collections::HashMap;

use super::normalize::{normalize_value, NormalizedValue};
use super::schema::PrimaryKeySpec;
use super::value::SqlValue;

/// Delimiter between composite key components in reports.
pub const KEY_DELIMITER: &str = ", ";

/// Primary key tuple, normalized so it can serve as the join key between
/// the two instances. Ordering is the tuple's lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey(pub Vec<NormalizedValue>);

impl RowKey {
    /// Build a key from raw key values in declared key order.
    pub fn from_values(values: &[SqlValue]) -> Self {
        Self(values.iter().map(normalize_value).collect())
    }

    /// Number of key components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the key has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Render raw key values for display, joined in declared key order.
pub fn format_key(values: &[SqlValue]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}

/// One row on one instance.
#[derive(Debug, Clone)]
pub struct RowSnapshot {
    /// Normalized join key.
    pub key: RowKey,

    /// Raw key values in declared key order (for display).
    pub key_values: Vec<SqlValue>,

    /// Every column of the row, key columns included.
    pub values: HashMap<String, SqlValue>,
}

impl RowSnapshot {
    /// Build a snapshot from column/value pairs, extracting the key.
    ///
    /// Key columns missing from `values` are read as NULL.
    pub fn new(primary_key: &PrimaryKeySpec, values: HashMap<String, SqlValue>) -> Self {
        let key_values: Vec<SqlValue> = primary_key
            .columns()
            .iter()
            .map(|c| values.get(c).cloned().unwrap_or(SqlValue::Null))
            .collect();
        Self {
            key: RowKey::from_values(&key_values),
            key_values,
            values,
        }
    }

    /// Build a snapshot from a row in column order.
    pub fn from_row(primary_key: &PrimaryKeySpec, columns: &[String], row: Vec<SqlValue>) -> Self {
        let values = columns.iter().cloned().zip(row).collect();
        Self::new(primary_key, values)
    }

    /// Value of a column, if the row has it.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    /// Display form of this row's key.
    pub fn display_key(&self) -> String {
        format_key(&self.key_values)
    }
}

/// Full row set of a table on one instance.
#[derive(Debug, Clone, Default)]
pub struct TableRows {
    /// Column names in schema order.
    pub columns: Vec<String>,

    /// All rows, in whatever order the source returned them.
    pub rows: Vec<RowSnapshot>,
}

impl TableRows {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
