//! Difference records and per-stage results.
//!
//! Every record is a fixed-shape struct so each field is statically known.
//! Records are produced once and never modified.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{display_default, ColumnDescriptor};

/// Column marker used for whole-row differences.
pub const ALL_COLUMNS: &str = "ALL";

/// Marker for fields that do not exist on one side.
pub const NOT_APPLICABLE: &str = "N/A";

// =============================================================================
// Table records
// =============================================================================

/// Whether a table exists on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Present,
    Missing,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Present => f.write_str("Present"),
            Presence::Missing => f.write_str("Missing"),
        }
    }
}

/// Presence of one table on both instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDifference {
    pub table: String,
    pub instance1: Presence,
    pub instance2: Presence,
}

impl TableDifference {
    /// Human-readable description of the divergence (`None` for common tables).
    pub fn difference(&self) -> &'static str {
        match (self.instance1, self.instance2) {
            (Presence::Present, Presence::Missing) => "Table missing in Instance 2",
            (Presence::Missing, Presence::Present) => "Table missing in Instance 1",
            _ => "None",
        }
    }

    /// Whether the table exists on both sides.
    pub fn is_common(&self) -> bool {
        self.instance1 == Presence::Present && self.instance2 == Presence::Present
    }
}

// =============================================================================
// Column records
// =============================================================================

/// Classification of a column difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnStatus {
    OnlyInInstance1,
    OnlyInInstance2,
    Different,
}

impl fmt::Display for ColumnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnStatus::OnlyInInstance1 => f.write_str("Only in Instance 1"),
            ColumnStatus::OnlyInInstance2 => f.write_str("Only in Instance 2"),
            ColumnStatus::Different => f.write_str("Different"),
        }
    }
}

/// One side of a column record: the descriptor, or an explicit N/A marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSide {
    Present(ColumnDescriptor),
    NotApplicable,
}

impl ColumnSide {
    fn field(&self, f: impl FnOnce(&ColumnDescriptor) -> String) -> String {
        match self {
            ColumnSide::Present(col) => f(col),
            ColumnSide::NotApplicable => NOT_APPLICABLE.to_string(),
        }
    }

    pub fn type_label(&self) -> String {
        self.field(|c| c.column_type.clone())
    }

    pub fn null_label(&self) -> String {
        self.field(|c| c.nullable_label().to_string())
    }

    pub fn key_label(&self) -> String {
        self.field(|c| c.key.clone())
    }

    pub fn default_label(&self) -> String {
        self.field(|c| display_default(c.default.as_deref()))
    }

    pub fn extra_label(&self) -> String {
        self.field(|c| c.extra.clone())
    }
}

/// Column attribute compared between instances, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Aspect {
    Type,
    Nullable,
    Key,
    Default,
    Extra,
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aspect::Type => "Type",
            Aspect::Nullable => "Nullable",
            Aspect::Key => "Key",
            Aspect::Default => "Default",
            Aspect::Extra => "Extra",
        };
        f.write_str(name)
    }
}

/// A single differing attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectChange {
    pub aspect: Aspect,
    pub value1: String,
    pub value2: String,
}

impl fmt::Display for AspectChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} vs {})", self.aspect, self.value1, self.value2)
    }
}

/// A column that is one-sided or differs in at least one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDifference {
    pub table: String,
    pub column: String,
    pub status: ColumnStatus,
    pub instance1: ColumnSide,
    pub instance2: ColumnSide,
    /// Differing attributes in [`Aspect`] order. Empty for one-sided columns.
    pub changes: Vec<AspectChange>,
}

impl ColumnDifference {
    /// Differing attributes joined as `Name(a vs b), ...`.
    pub fn changed_aspects(&self) -> String {
        self.changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Human-readable description of the divergence.
    pub fn difference(&self) -> String {
        match self.status {
            ColumnStatus::OnlyInInstance1 => "Column missing in Instance 2".to_string(),
            ColumnStatus::OnlyInInstance2 => "Column missing in Instance 1".to_string(),
            ColumnStatus::Different => self.changed_aspects(),
        }
    }
}

// =============================================================================
// Row records
// =============================================================================

/// Classification of a row difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    OnlyInInstance1,
    OnlyInInstance2,
    DifferentValues,
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::OnlyInInstance1 => f.write_str("Only in Instance 1"),
            RowStatus::OnlyInInstance2 => f.write_str("Only in Instance 2"),
            RowStatus::DifferentValues => f.write_str("Different Values"),
        }
    }
}

/// A one-sided row or a differing cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDifference {
    pub table: String,
    /// Rendered primary key (see [`crate::core::format_key`]).
    pub primary_key: String,
    pub status: RowStatus,
    /// Column name, or [`ALL_COLUMNS`] for one-sided rows.
    pub column: String,
    pub value1: String,
    pub value2: String,
}

impl RowDifference {
    /// Record for a row that exists only on instance 1.
    pub fn only_in_instance1(table: &str, primary_key: String) -> Self {
        Self {
            table: table.to_string(),
            primary_key,
            status: RowStatus::OnlyInInstance1,
            column: ALL_COLUMNS.to_string(),
            value1: "Exists".to_string(),
            value2: "Missing".to_string(),
        }
    }

    /// Record for a row that exists only on instance 2.
    pub fn only_in_instance2(table: &str, primary_key: String) -> Self {
        Self {
            table: table.to_string(),
            primary_key,
            status: RowStatus::OnlyInInstance2,
            column: ALL_COLUMNS.to_string(),
            value1: "Missing".to_string(),
            value2: "Exists".to_string(),
        }
    }

    /// Human-readable description of the divergence.
    pub fn difference(&self) -> String {
        match self.status {
            RowStatus::OnlyInInstance1 => "Row missing in Instance 2".to_string(),
            RowStatus::OnlyInInstance2 => "Row missing in Instance 1".to_string(),
            RowStatus::DifferentValues => {
                format!("Different values ({} vs {})", self.value1, self.value2)
            }
        }
    }
}

/// Any difference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DifferenceRecord {
    Table(TableDifference),
    Column(ColumnDifference),
    Row(RowDifference),
}

// =============================================================================
// Stage results
// =============================================================================

/// Comparison stage, for skip bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Tables,
    Columns,
    Rows,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Tables => f.write_str("tables"),
            Stage::Columns => f.write_str("columns"),
            Stage::Rows => f.write_str("rows"),
        }
    }
}

/// A table a stage could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTable {
    pub table: String,
    pub stage: Stage,
    pub reason: String,
}

/// Output of the table set comparator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableComparison {
    pub only_in_instance1: Vec<String>,
    pub only_in_instance2: Vec<String>,
    pub common: Vec<String>,
    /// One record per table: only-1 block, only-2 block, common block.
    pub records: Vec<TableDifference>,
}

/// Output of the column comparator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnComparison {
    pub records: Vec<ColumnDifference>,
    pub tables_compared: usize,
    pub tables_with_differences: usize,
    pub skipped: Vec<SkippedTable>,
}

/// What happened to one table in the row stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    /// Rows were joined and compared.
    Compared {
        only_in_instance1: usize,
        only_in_instance2: usize,
        different_values: usize,
    },
    /// The table has no primary key; nothing was compared.
    SkippedNoPrimaryKey,
    /// Metadata or data fetch failed; nothing was compared.
    Failed { reason: String },
}

impl RowOutcome {
    /// Number of records the table produced.
    pub fn differences(&self) -> usize {
        match self {
            RowOutcome::Compared {
                only_in_instance1,
                only_in_instance2,
                different_values,
            } => only_in_instance1 + only_in_instance2 + different_values,
            _ => 0,
        }
    }

    /// Whether the table was actually compared.
    pub fn is_compared(&self) -> bool {
        matches!(self, RowOutcome::Compared { .. })
    }
}

/// Row stage result for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRowResult {
    pub table: String,
    pub outcome: RowOutcome,
}

/// Output of the row comparator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowComparison {
    pub records: Vec<RowDifference>,
    /// Per-table outcomes in processing order.
    pub tables: Vec<TableRowResult>,
    pub tables_with_differences: usize,
}

impl RowComparison {
    /// Tables skipped because they have no primary key.
    pub fn tables_without_primary_key(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| t.outcome == RowOutcome::SkippedNoPrimaryKey)
            .map(|t| t.table.as_str())
            .collect()
    }

    /// Tables whose row comparison failed, with the reason.
    pub fn failed_tables(&self) -> Vec<(&str, &str)> {
        self.tables
            .iter()
            .filter_map(|t| match &t.outcome {
                RowOutcome::Failed { reason } => Some((t.table.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// Full result of a comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareReport {
    /// Database name compared on instance 1.
    pub database: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub tables: TableComparison,
    /// `None` when the column stage was disabled.
    pub columns: Option<ColumnComparison>,
    /// `None` when the row stage was disabled.
    pub rows: Option<RowComparison>,
}

impl CompareReport {
    /// All records in reporting order: tables, then columns, then rows.
    pub fn records(&self) -> Vec<DifferenceRecord> {
        let mut out: Vec<DifferenceRecord> = self
            .tables
            .records
            .iter()
            .cloned()
            .map(DifferenceRecord::Table)
            .collect();
        if let Some(columns) = &self.columns {
            out.extend(columns.records.iter().cloned().map(DifferenceRecord::Column));
        }
        if let Some(rows) = &self.rows {
            out.extend(rows.records.iter().cloned().map(DifferenceRecord::Row));
        }
        out
    }

    /// Whether any divergence was found.
    pub fn has_differences(&self) -> bool {
        !self.tables.only_in_instance1.is_empty()
            || !self.tables.only_in_instance2.is_empty()
            || self.columns.as_ref().is_some_and(|c| !c.records.is_empty())
            || self.rows.as_ref().is_some_and(|r| !r.records.is_empty())
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
