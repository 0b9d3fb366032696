//! Primary-key join and cell-level diff for one table.
//!
//! Both row sets are loaded into key-ordered maps and walked as a sorted
//! merge, so the source row order never matters and output is deterministic.
//! Swapping the maps for key-ordered cursors would turn this into a chunked
//! comparison without changing the output.

use std::collections::{BTreeMap, HashSet};

use std::collections::btree_map::Entry;

use crate::core::{
    values_equal, Instance, PrimaryKeySpec, RowKey, RowSnapshot, SqlValue, TableRows,
};
use crate::error::{CompareError, Result};

use super::types::{RowDifference, RowOutcome, RowStatus};

/// Records and counts for one compared table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSetDiff {
    pub records: Vec<RowDifference>,
    pub only_in_instance1: usize,
    pub only_in_instance2: usize,
    pub different_values: usize,
}

impl RowSetDiff {
    /// Outcome summary for this table.
    pub fn outcome(&self) -> RowOutcome {
        RowOutcome::Compared {
            only_in_instance1: self.only_in_instance1,
            only_in_instance2: self.only_in_instance2,
            different_values: self.different_values,
        }
    }
}

/// Key the rows of one instance. Fails when the row set lacks a key column
/// or two rows share a key.
fn keyed(
    table: &str,
    instance: Instance,
    primary_key: &PrimaryKeySpec,
    rows: TableRows,
) -> Result<BTreeMap<RowKey, RowSnapshot>> {
    if let Some(missing) = primary_key
        .columns()
        .iter()
        .find(|c| !rows.columns.contains(*c))
    {
        return Err(CompareError::data_fetch(
            instance,
            table,
            format!("primary key column {} not found", missing),
        ));
    }

    let mut map = BTreeMap::new();
    for row in rows.rows {
        match map.entry(row.key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(_) => {
                return Err(CompareError::data_fetch(
                    instance,
                    table,
                    format!("duplicate primary key ({})", row.display_key()),
                ));
            }
        }
    }
    Ok(map)
}

/// Full outer join of two row sets on the primary key.
///
/// Emits left-only rows, then right-only rows, then differing cells of
/// matched rows, each block in ascending key order. Cells are compared in
/// instance 1 column order; key columns and columns missing on instance 2
/// are not compared.
///
/// Fails with a data error when either row set lacks a key column or holds
/// two rows with the same key.
pub fn compare_row_sets(
    table: &str,
    primary_key: &PrimaryKeySpec,
    rows1: TableRows,
    rows2: TableRows,
) -> Result<RowSetDiff> {
    let columns2: HashSet<&str> = rows2.columns.iter().map(String::as_str).collect();
    let compared_columns: Vec<String> = rows1
        .columns
        .iter()
        .filter(|c| !primary_key.contains(c) && columns2.contains(c.as_str()))
        .cloned()
        .collect();

    let map1 = keyed(table, Instance::One, primary_key, rows1)?;
    let map2 = keyed(table, Instance::Two, primary_key, rows2)?;

    let mut diff = RowSetDiff::default();

    for (key, row) in &map1 {
        if !map2.contains_key(key) {
            diff.records
                .push(RowDifference::only_in_instance1(table, row.display_key()));
            diff.only_in_instance1 += 1;
        }
    }

    for (key, row) in &map2 {
        if !map1.contains_key(key) {
            diff.records
                .push(RowDifference::only_in_instance2(table, row.display_key()));
            diff.only_in_instance2 += 1;
        }
    }

    let null = SqlValue::Null;
    for (key, row1) in &map1 {
        let Some(row2) = map2.get(key) else {
            continue;
        };
        for column in &compared_columns {
            let v1 = row1.get(column).unwrap_or(&null);
            let v2 = row2.get(column).unwrap_or(&null);
            if !values_equal(v1, v2) {
                diff.records.push(RowDifference {
                    table: table.to_string(),
                    primary_key: row1.display_key(),
                    status: RowStatus::DifferentValues,
                    column: column.clone(),
                    value1: v1.to_string(),
                    value2: v2.to_string(),
                });
                diff.different_values += 1;
            }
        }
    }

    Ok(diff)
}
