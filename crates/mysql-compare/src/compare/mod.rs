//! Three-stage comparison engine.
//!
//! - **Tables**: set-reconcile table names, yielding the common set
//! - **Columns**: per common table, diff column definitions attribute by attribute
//! - **Rows**: per common table with a primary key, outer-join rows on the key
//!   and diff matched rows cell by cell
//!
//! Column and row stages both consume the common set and run independently.
//! Within a stage, tables are processed concurrently up to `workers`, through
//! an order-preserving buffered stream, so records always come out in table
//! order regardless of which table finishes first.
//!
//! Metadata and data errors are contained at the table boundary: the table is
//! skipped for that stage and the run continues. Any other error aborts.

pub mod columns;
pub mod filter;
pub mod rows;
pub mod tables;
pub mod types;

pub use columns::{attribute_changes, compare_column_sets};
pub use filter::TableFilter;
pub use rows::{compare_row_sets, RowSetDiff};
pub use tables::compare_table_sets;
pub use types::{
    Aspect, AspectChange, ColumnComparison, ColumnDifference, ColumnSide, ColumnStatus,
    CompareReport, DifferenceRecord, Presence, RowComparison, RowDifference, RowOutcome,
    RowStatus, SkippedTable, Stage, TableComparison, TableDifference, TableRowResult,
    ALL_COLUMNS, NOT_APPLICABLE,
};

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{ColumnDescriptor, DataProvider, Instance, MetadataProvider, TableName};
use crate::error::{CompareError, Result};

/// Engine settings.
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Tables processed concurrently per stage.
    pub workers: usize,
    /// Run the column stage.
    pub compare_columns: bool,
    /// Run the row stage.
    pub compare_rows: bool,
    /// Table name filter applied to both instances before the table stage.
    pub filter: TableFilter,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            compare_columns: true,
            compare_rows: true,
            filter: TableFilter::default(),
        }
    }
}

/// Comparison engine over any metadata + data provider.
pub struct CompareEngine<P> {
    provider: Arc<P>,
    options: CompareOptions,
}

impl<P> CompareEngine<P>
where
    P: MetadataProvider + DataProvider,
{
    /// Create a new engine.
    pub fn new(provider: Arc<P>, options: CompareOptions) -> Self {
        Self { provider, options }
    }

    fn workers(&self) -> usize {
        self.options.workers.max(1)
    }

    /// Run every enabled stage and assemble the report.
    ///
    /// `cancel` is checked before each stage starts.
    pub async fn run(&self, database: &str, cancel: &CancellationToken) -> Result<CompareReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        info!("Comparing database {} across both instances", database);

        if cancel.is_cancelled() {
            return Err(CompareError::Cancelled);
        }
        let tables = self.compare_tables().await;

        let columns = if self.options.compare_columns {
            if cancel.is_cancelled() {
                return Err(CompareError::Cancelled);
            }
            Some(self.compare_columns(&tables.common).await?)
        } else {
            info!("Column comparison disabled");
            None
        };

        let rows = if self.options.compare_rows {
            if cancel.is_cancelled() {
                return Err(CompareError::Cancelled);
            }
            Some(self.compare_rows(&tables.common).await?)
        } else {
            info!("Row comparison disabled");
            None
        };

        let report = CompareReport {
            database: database.to_string(),
            started_at,
            completed_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
            tables,
            columns,
            rows,
        };

        info!(
            "Comparison completed in {} ms ({})",
            report.duration_ms,
            if report.has_differences() {
                "differences found"
            } else {
                "no differences"
            }
        );

        Ok(report)
    }

    /// List and filter the tables of one instance.
    ///
    /// A listing failure is logged and treated as an empty list.
    pub async fn list_tables(&self, instance: Instance) -> Vec<TableName> {
        match self.provider.list_tables(instance).await {
            Ok(tables) => {
                let total = tables.len();
                let tables = self.options.filter.apply(tables);
                debug!(
                    "{}: {} tables ({} after filtering)",
                    instance,
                    total,
                    tables.len()
                );
                tables
            }
            Err(e) => {
                warn!("Failed to list tables on {}: {}", instance, e);
                Vec::new()
            }
        }
    }

    /// Table stage.
    pub async fn compare_tables(&self) -> TableComparison {
        let (tables1, tables2) =
            futures::join!(self.list_tables(Instance::One), self.list_tables(Instance::Two));

        let result = compare_table_sets(&tables1, &tables2);
        info!(
            "Tables: {} only in Instance 1, {} only in Instance 2, {} common",
            result.only_in_instance1.len(),
            result.only_in_instance2.len(),
            result.common.len()
        );
        result
    }

    /// Column stage over the given tables (expected in sorted order).
    pub async fn compare_columns(&self, tables: &[String]) -> Result<ColumnComparison> {
        info!("Comparing columns of {} tables", tables.len());

        let results: Vec<(&String, Result<Vec<ColumnDifference>>)> = stream::iter(tables)
            .map(|table| async move { (table, self.columns_for_table(table).await) })
            .buffered(self.workers())
            .collect()
            .await;

        let mut comparison = ColumnComparison::default();
        for (table, result) in results {
            match result {
                Ok(records) => {
                    comparison.tables_compared += 1;
                    if !records.is_empty() {
                        comparison.tables_with_differences += 1;
                        info!("Table {}: {} column differences", table, records.len());
                    }
                    comparison.records.extend(records);
                }
                Err(e) if !e.is_fatal() => {
                    warn!("Skipping column comparison for table {}: {}", table, e);
                    comparison.skipped.push(SkippedTable {
                        table: table.clone(),
                        stage: Stage::Columns,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Columns: {} differences in {} of {} tables ({} skipped)",
            comparison.records.len(),
            comparison.tables_with_differences,
            comparison.tables_compared,
            comparison.skipped.len()
        );
        Ok(comparison)
    }

    async fn columns_for_table(&self, table: &str) -> Result<Vec<ColumnDifference>> {
        let (columns1, columns2): (Vec<ColumnDescriptor>, Vec<ColumnDescriptor>) = futures::try_join!(
            self.provider.get_columns(Instance::One, table),
            self.provider.get_columns(Instance::Two, table)
        )?;
        Ok(compare_column_sets(table, &columns1, &columns2))
    }

    /// Row stage over the given tables (expected in sorted order).
    pub async fn compare_rows(&self, tables: &[String]) -> Result<RowComparison> {
        info!("Comparing rows of {} tables", tables.len());

        let results: Vec<(&String, Result<Option<RowSetDiff>>)> = stream::iter(tables)
            .map(|table| async move { (table, self.rows_for_table(table).await) })
            .buffered(self.workers())
            .collect()
            .await;

        let mut comparison = RowComparison::default();
        for (table, result) in results {
            let outcome = match result {
                Ok(Some(diff)) => {
                    let outcome = diff.outcome();
                    if !diff.records.is_empty() {
                        comparison.tables_with_differences += 1;
                        info!("Table {}: {} row differences", table, diff.records.len());
                    }
                    comparison.records.extend(diff.records);
                    outcome
                }
                Ok(None) => {
                    warn!(
                        "Table {} has no primary key, skipping row comparison",
                        table
                    );
                    RowOutcome::SkippedNoPrimaryKey
                }
                Err(e) if !e.is_fatal() => {
                    warn!("Row comparison failed for table {}: {}", table, e);
                    RowOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };
            comparison.tables.push(TableRowResult {
                table: table.clone(),
                outcome,
            });
        }

        info!(
            "Rows: {} differences in {} tables",
            comparison.records.len(),
            comparison.tables_with_differences
        );
        Ok(comparison)
    }

    /// `None` when the table has no primary key on instance 1.
    async fn rows_for_table(&self, table: &str) -> Result<Option<RowSetDiff>> {
        let primary_key = self.provider.get_primary_key(Instance::One, table).await?;
        if primary_key.is_empty() {
            return Ok(None);
        }
        debug!("Table {} primary key {}", table, primary_key);

        let (rows1, rows2) = futures::try_join!(
            self.provider.fetch_all_rows(Instance::One, table, &primary_key),
            self.provider.fetch_all_rows(Instance::Two, table, &primary_key)
        )?;
        debug!(
            "Table {}: {} rows on Instance 1, {} rows on Instance 2",
            table,
            rows1.len(),
            rows2.len()
        );

        compare_row_sets(table, &primary_key, rows1, rows2).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PrimaryKeySpec, RowSnapshot, SqlValue, TableRows};
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Clone, Default)]
    struct MemTable {
        columns: Vec<ColumnDescriptor>,
        primary_key: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
        fail_metadata: bool,
        fail_fetch: bool,
    }

    #[derive(Default)]
    struct MemoryProvider {
        tables: HashMap<(Instance, String), MemTable>,
        fail_listing: Option<Instance>,
        fail_connection: bool,
    }

    impl MemoryProvider {
        fn add(&mut self, instance: Instance, name: &str, table: MemTable) {
            self.tables.insert((instance, name.to_string()), table);
        }

        fn table(&self, instance: Instance, name: &str) -> Result<&MemTable> {
            if self.fail_connection {
                return Err(CompareError::connection(instance, "connection reset"));
            }
            self.tables
                .get(&(instance, name.to_string()))
                .ok_or_else(|| CompareError::metadata(instance, name, "table not found"))
        }
    }

    #[async_trait]
    impl MetadataProvider for MemoryProvider {
        async fn list_tables(&self, instance: Instance) -> Result<Vec<TableName>> {
            if self.fail_listing == Some(instance) {
                return Err(CompareError::connection(instance, "lost connection"));
            }
            let mut names: Vec<String> = self
                .tables
                .keys()
                .filter(|(i, _)| *i == instance)
                .map(|(_, n)| n.clone())
                .collect();
            // Unsorted on purpose; the engine must not rely on source order.
            names.reverse();
            Ok(names)
        }

        async fn get_columns(
            &self,
            instance: Instance,
            table: &str,
        ) -> Result<Vec<ColumnDescriptor>> {
            let t = self.table(instance, table)?;
            if t.fail_metadata {
                return Err(CompareError::metadata(instance, table, "access denied"));
            }
            Ok(t.columns.clone())
        }

        async fn get_primary_key(&self, instance: Instance, table: &str) -> Result<PrimaryKeySpec> {
            let t = self.table(instance, table)?;
            if t.fail_metadata {
                return Err(CompareError::metadata(instance, table, "access denied"));
            }
            Ok(PrimaryKeySpec::new(t.primary_key.clone()))
        }
    }

    #[async_trait]
    impl DataProvider for MemoryProvider {
        async fn fetch_all_rows(
            &self,
            instance: Instance,
            table: &str,
            primary_key: &PrimaryKeySpec,
        ) -> Result<TableRows> {
            let t = self.table(instance, table)?;
            if t.fail_fetch {
                return Err(CompareError::data_fetch(instance, table, "timeout"));
            }
            let columns: Vec<String> = t.columns.iter().map(|c| c.name.clone()).collect();
            let rows = t
                .rows
                .iter()
                .map(|r| RowSnapshot::from_row(primary_key, &columns, r.clone()))
                .collect();
            Ok(TableRows { columns, rows })
        }
    }

    fn col(name: &str, column_type: &str, nullable: bool, key: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            column_type: column_type.to_string(),
            nullable,
            key: key.to_string(),
            default: None,
            extra: String::new(),
        }
    }

    fn users() -> MemTable {
        MemTable {
            columns: vec![
                col("id", "int", false, "PRI"),
                col("email", "varchar(255)", true, ""),
            ],
            primary_key: vec!["id".to_string()],
            rows: vec![
                vec![SqlValue::Int(1), SqlValue::from("a@example.com")],
                vec![SqlValue::Int(2), SqlValue::Null],
            ],
            ..Default::default()
        }
    }

    fn orders(rows: Vec<(i64, &str)>) -> MemTable {
        MemTable {
            columns: vec![
                col("id", "int", false, "PRI"),
                col("status", "varchar(16)", false, ""),
            ],
            primary_key: vec!["id".to_string()],
            rows: rows
                .into_iter()
                .map(|(id, s)| vec![SqlValue::Int(id), SqlValue::from(s)])
                .collect(),
            ..Default::default()
        }
    }

    fn logs() -> MemTable {
        MemTable {
            columns: vec![col("message", "text", true, "")],
            primary_key: Vec::new(),
            rows: vec![vec![SqlValue::from("hello")]],
            ..Default::default()
        }
    }

    fn engine(provider: MemoryProvider) -> CompareEngine<MemoryProvider> {
        CompareEngine::new(Arc::new(provider), CompareOptions::default())
    }

    async fn run(provider: MemoryProvider) -> CompareReport {
        engine(provider)
            .run("shop", &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_identical_instances_have_no_differences() {
        let mut p = MemoryProvider::default();
        for i in Instance::BOTH {
            p.add(i, "users", users());
            p.add(i, "orders", orders(vec![(1, "paid"), (2, "open")]));
        }

        let report = run(p).await;
        assert!(!report.has_differences());
        assert_eq!(report.tables.common, vec!["orders", "users"]);
        assert!(report.columns.unwrap().records.is_empty());
        let rows = report.rows.unwrap();
        assert!(rows.records.is_empty());
        assert!(rows.tables.iter().all(|t| t.outcome.is_compared()));
    }

    #[tokio::test]
    async fn test_table_set_scenario() {
        let mut p = MemoryProvider::default();
        p.add(Instance::One, "users", users());
        p.add(Instance::One, "orders", orders(vec![]));
        p.add(Instance::Two, "users", users());
        p.add(Instance::Two, "products", orders(vec![]));

        let report = run(p).await;
        assert_eq!(report.tables.only_in_instance1, vec!["orders"]);
        assert_eq!(report.tables.only_in_instance2, vec!["products"]);
        assert_eq!(report.tables.common, vec!["users"]);
    }

    #[tokio::test]
    async fn test_column_scenario() {
        let mut p = MemoryProvider::default();
        p.add(Instance::One, "users", users());
        let mut changed = users();
        changed.columns[1] = col("email", "varchar(100)", false, "");
        p.add(Instance::Two, "users", changed);

        let report = run(p).await;
        let columns = report.columns.unwrap();
        assert_eq!(columns.records.len(), 1);
        assert_eq!(columns.records[0].column, "email");
        assert_eq!(
            columns.records[0].difference(),
            "Type(varchar(255) vs varchar(100)), Nullable(YES vs NO)"
        );
        assert_eq!(columns.tables_with_differences, 1);
    }

    #[tokio::test]
    async fn test_row_scenarios() {
        let mut p = MemoryProvider::default();
        p.add(Instance::One, "orders", orders(vec![(1, "paid"), (2, "open")]));
        p.add(Instance::Two, "orders", orders(vec![(1, "pending")]));

        let report = run(p).await;
        let rows = report.rows.unwrap();
        let summary: Vec<(RowStatus, &str, &str)> = rows
            .records
            .iter()
            .map(|r| (r.status, r.primary_key.as_str(), r.column.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (RowStatus::OnlyInInstance1, "2", ALL_COLUMNS),
                (RowStatus::DifferentValues, "1", "status"),
            ]
        );
        assert_eq!(rows.records[1].value1, "paid");
        assert_eq!(rows.records[1].value2, "pending");
        assert_eq!(
            rows.tables[0].outcome,
            RowOutcome::Compared {
                only_in_instance1: 1,
                only_in_instance2: 0,
                different_values: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_table_without_primary_key_is_skipped() {
        let mut p = MemoryProvider::default();
        for i in Instance::BOTH {
            p.add(i, "logs", logs());
            p.add(i, "users", users());
        }
        let mut other_logs = logs();
        other_logs.rows = vec![vec![SqlValue::from("different")]];
        p.add(Instance::Two, "logs", other_logs);

        let report = run(p).await;
        let rows = report.rows.unwrap();
        assert!(rows.records.is_empty());
        assert_eq!(rows.tables_without_primary_key(), vec!["logs"]);
        assert_eq!(rows.tables.len(), 2);
        assert!(rows.tables[1].outcome.is_compared());
    }

    #[tokio::test]
    async fn test_metadata_failure_skips_table_only() {
        let mut p = MemoryProvider::default();
        for i in Instance::BOTH {
            p.add(i, "orders", orders(vec![(1, "paid")]));
        }
        p.add(Instance::One, "users", users());
        p.add(
            Instance::Two,
            "users",
            MemTable {
                fail_metadata: true,
                ..users()
            },
        );

        let report = run(p).await;
        let columns = report.columns.unwrap();
        assert_eq!(columns.tables_compared, 1);
        assert_eq!(columns.skipped.len(), 1);
        assert_eq!(columns.skipped[0].table, "users");
        assert_eq!(columns.skipped[0].stage, Stage::Columns);

        // The row stage only reads the key from instance 1.
        let rows = report.rows.unwrap();
        assert!(rows.tables.iter().all(|t| t.outcome.is_compared()));
    }

    #[tokio::test]
    async fn test_fetch_failure_marks_table_failed() {
        let mut p = MemoryProvider::default();
        p.add(Instance::One, "orders", orders(vec![(1, "paid")]));
        p.add(
            Instance::Two,
            "orders",
            MemTable {
                fail_fetch: true,
                ..orders(vec![(1, "paid")])
            },
        );
        for i in Instance::BOTH {
            p.add(i, "users", users());
        }

        let report = run(p).await;
        let rows = report.rows.unwrap();
        let failed = rows.failed_tables();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "orders");
        assert!(failed[0].1.contains("timeout"));
        assert!(rows.tables[1].outcome.is_compared());
    }

    #[tokio::test]
    async fn test_duplicate_key_marks_table_failed() {
        let mut p = MemoryProvider::default();
        p.add(Instance::One, "orders", orders(vec![(1, "paid")]));
        // Instance 2 keys on a wider tuple, so `id` alone repeats.
        p.add(
            Instance::Two,
            "orders",
            MemTable {
                primary_key: vec!["id".to_string(), "status".to_string()],
                ..orders(vec![(1, "paid"), (1, "open")])
            },
        );

        let report = run(p).await;
        let rows = report.rows.unwrap();
        assert!(rows.records.is_empty());
        let failed = rows.failed_tables();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "orders");
        assert!(failed[0].1.contains("duplicate primary key (1)"));
    }

    #[tokio::test]
    async fn test_renamed_key_column_marks_table_failed() {
        let mut p = MemoryProvider::default();
        p.add(Instance::One, "orders", orders(vec![(1, "paid")]));
        let mut renamed = orders(vec![(1, "paid"), (2, "open")]);
        renamed.columns[0] = col("order_id", "int", false, "PRI");
        renamed.primary_key = vec!["order_id".to_string()];
        p.add(Instance::Two, "orders", renamed);

        let report = run(p).await;
        let rows = report.rows.unwrap();
        assert!(rows.records.is_empty());
        let failed = rows.failed_tables();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].1.contains("primary key column id not found"));
    }

    #[tokio::test]
    async fn test_listing_failure_is_treated_as_empty() {
        let mut p = MemoryProvider::default();
        for i in Instance::BOTH {
            p.add(i, "users", users());
        }
        p.fail_listing = Some(Instance::Two);

        let report = run(p).await;
        assert_eq!(report.tables.only_in_instance1, vec!["users"]);
        assert!(report.tables.common.is_empty());
    }

    #[tokio::test]
    async fn test_connection_error_aborts() {
        let mut p = MemoryProvider::default();
        for i in Instance::BOTH {
            p.add(i, "users", users());
        }
        p.fail_connection = true;

        let engine = engine(p);
        let err = engine.compare_columns(&["users".to_string()]).await.unwrap_err();
        assert!(matches!(err, CompareError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let p = MemoryProvider::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine(p).run("shop", &cancel).await.unwrap_err();
        assert!(matches!(err, CompareError::Cancelled));
    }

    #[tokio::test]
    async fn test_disabled_stages() {
        let mut p = MemoryProvider::default();
        for i in Instance::BOTH {
            p.add(i, "users", users());
        }
        let options = CompareOptions {
            compare_columns: false,
            compare_rows: false,
            ..Default::default()
        };

        let report = CompareEngine::new(Arc::new(p), options)
            .run("shop", &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.columns.is_none());
        assert!(report.rows.is_none());
        assert_eq!(report.records().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_applies_to_both_instances() {
        let mut p = MemoryProvider::default();
        for i in Instance::BOTH {
            p.add(i, "users", users());
            p.add(i, "tmp_import", logs());
        }
        p.add(Instance::One, "tmp_only", logs());
        let options = CompareOptions {
            filter: TableFilter::new(&[], &["tmp_*".to_string()]).unwrap(),
            ..Default::default()
        };

        let report = CompareEngine::new(Arc::new(p), options)
            .run("shop", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.tables.records.len(), 1);
        assert_eq!(report.tables.common, vec!["users"]);
    }

    #[tokio::test]
    async fn test_runs_are_deterministic() {
        let build = || {
            let mut p = MemoryProvider::default();
            for n in 0..12 {
                let name = format!("t{:02}", n);
                p.add(Instance::One, &name, orders(vec![(1, "a"), (2, "b"), (3, "c")]));
                p.add(Instance::Two, &name, orders(vec![(3, "x"), (1, "a"), (4, "d")]));
            }
            p
        };

        let first = run(build()).await.records();
        let second = run(build()).await.records();
        assert_eq!(first, second);

        let row_tables: Vec<String> = first
            .iter()
            .filter_map(|r| match r {
                DifferenceRecord::Row(r) => Some(r.table.clone()),
                _ => None,
            })
            .collect();
        let mut sorted = row_tables.clone();
        sorted.sort();
        assert_eq!(row_tables, sorted);
        assert_eq!(row_tables.len(), 12 * 3);
    }
}
