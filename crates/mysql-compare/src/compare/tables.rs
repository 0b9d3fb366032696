//! Table set reconciliation.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::types::{Presence, TableComparison, TableDifference};

/// Partition two table name lists into only-1, only-2 and common groups.
///
/// Names are compared case-sensitively and each group is sorted in byte
/// order. Duplicate names within one list collapse.
pub fn compare_table_sets(tables1: &[String], tables2: &[String]) -> TableComparison {
    let set1: BTreeSet<&str> = tables1.iter().map(String::as_str).collect();
    let set2: BTreeSet<&str> = tables2.iter().map(String::as_str).collect();

    if set1.is_empty() && set2.is_empty() {
        warn!("No tables found on either instance");
        return TableComparison::default();
    }

    let only_in_instance1: Vec<String> = set1.difference(&set2).map(|s| s.to_string()).collect();
    let only_in_instance2: Vec<String> = set2.difference(&set1).map(|s| s.to_string()).collect();
    let common: Vec<String> = set1.intersection(&set2).map(|s| s.to_string()).collect();

    let mut records =
        Vec::with_capacity(only_in_instance1.len() + only_in_instance2.len() + common.len());
    for table in &only_in_instance1 {
        debug!("Table {} only in Instance 1", table);
        records.push(TableDifference {
            table: table.clone(),
            instance1: Presence::Present,
            instance2: Presence::Missing,
        });
    }
    for table in &only_in_instance2 {
        debug!("Table {} only in Instance 2", table);
        records.push(TableDifference {
            table: table.clone(),
            instance1: Presence::Missing,
            instance2: Presence::Present,
        });
    }
    for table in &common {
        records.push(TableDifference {
            table: table.clone(),
            instance1: Presence::Present,
            instance2: Presence::Present,
        });
    }

    TableComparison {
        only_in_instance1,
        only_in_instance2,
        common,
        records,
    }
}
