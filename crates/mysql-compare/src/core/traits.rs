//! Capability traits the comparison engine consumes.
//!
//! - [`MetadataProvider`]: table names, column definitions, primary keys
//! - [`DataProvider`]: full row sets
//!
//! Both take an [`Instance`] handle; implementations decide what it maps to
//! (a connection pool, an in-memory fixture, ...). The engine never looks
//! behind the handle.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::row::TableRows;
use super::schema::{ColumnDescriptor, PrimaryKeySpec, TableName};

/// One of the two instances under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Instance {
    /// Instance 1 (left side of every comparison).
    One,
    /// Instance 2 (right side of every comparison).
    Two,
}

impl Instance {
    /// Both instances in comparison order.
    pub const BOTH: [Instance; 2] = [Instance::One, Instance::Two];

    /// Human-readable label used in logs and reports.
    pub fn label(self) -> &'static str {
        match self {
            Instance::One => "Instance 1",
            Instance::Two => "Instance 2",
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Schema metadata access.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// List the table names of an instance.
    async fn list_tables(&self, instance: Instance) -> Result<Vec<TableName>>;

    /// Column definitions of a table, in schema order.
    ///
    /// Fails with [`crate::CompareError::Metadata`].
    async fn get_columns(&self, instance: Instance, table: &str) -> Result<Vec<ColumnDescriptor>>;

    /// Primary key columns of a table (empty when there is none).
    ///
    /// Fails with [`crate::CompareError::Metadata`].
    async fn get_primary_key(&self, instance: Instance, table: &str) -> Result<PrimaryKeySpec>;
}

/// Row data access.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch every row of a table, keyed by `primary_key`.
    ///
    /// Fails with [`crate::CompareError::DataFetch`].
    async fn fetch_all_rows(
        &self,
        instance: Instance,
        table: &str,
        primary_key: &PrimaryKeySpec,
    ) -> Result<TableRows>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_labels() {
        assert_eq!(Instance::One.to_string(), "Instance 1");
        assert_eq!(Instance::Two.label(), "Instance 2");
        assert_eq!(Instance::BOTH, [Instance::One, Instance::Two]);
    }
}
