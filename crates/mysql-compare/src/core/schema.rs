//! Schema metadata types for tables, columns and primary keys.
//!
//! These are snapshots of one instance's catalog at the time they were fetched
//! and are never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Table name as reported by the engine. Compared case-sensitively.
pub type TableName = String;

/// Column definition as reported by `INFORMATION_SCHEMA.COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Full column type (e.g., "varchar(255)", "int unsigned").
    pub column_type: String,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Key role ("PRI", "UNI", "MUL" or empty).
    pub key: String,

    /// Default value; `None` when the catalog reports no default.
    pub default: Option<String>,

    /// Extra attributes (e.g., "auto_increment", "on update CURRENT_TIMESTAMP").
    pub extra: String,
}

impl ColumnDescriptor {
    /// Nullability rendered the way MySQL reports it.
    pub fn nullable_label(&self) -> &'static str {
        if self.nullable {
            "YES"
        } else {
            "NO"
        }
    }
}

/// Ordered primary key column names. Empty means the table has no primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeySpec(pub Vec<String>);

impl PrimaryKeySpec {
    /// Create a primary key spec from column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    /// Key columns in declared order.
    pub fn columns(&self) -> &[String] {
        &self.0
    }

    /// Whether the table has no primary key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of key columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether a column belongs to the key.
    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }
}

impl fmt::Display for PrimaryKeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}
