//! Report rendering.
//!
//! A [`ReportSink`] receives the record sequences of a finished run stage by
//! stage. [`CsvReportSink`] persists them as CSV files, [`ConsoleReportSink`]
//! prints them as tables.

pub mod console;
pub mod csv;

pub use self::console::ConsoleReportSink;
pub use self::csv::CsvReportSink;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::compare::{ColumnComparison, CompareReport, RowComparison, TableComparison};
use crate::config::ReportConfig;
use crate::error::Result;

/// Destination for comparison records.
pub trait ReportSink {
    /// Table presence records (always called).
    fn write_tables(&mut self, tables: &TableComparison) -> Result<()>;

    /// Column records (called only when the column stage ran).
    fn write_columns(&mut self, columns: &ColumnComparison) -> Result<()>;

    /// Row records (called only when the row stage ran).
    fn write_rows(&mut self, rows: &RowComparison) -> Result<()>;

    /// Flush and release resources.
    fn finish(&mut self) -> Result<()>;
}

/// Feed a finished report through a sink.
pub fn write_report(report: &CompareReport, sink: &mut dyn ReportSink) -> Result<()> {
    sink.write_tables(&report.tables)?;
    if let Some(columns) = &report.columns {
        sink.write_columns(columns)?;
    }
    if let Some(rows) = &report.rows {
        sink.write_rows(rows)?;
    }
    sink.finish()
}

/// Per-run report directory: `<output_dir>/<prefix>_<YYYYmmdd_HHMMSS>`.
pub fn run_directory(config: &ReportConfig, started_at: DateTime<Utc>) -> PathBuf {
    PathBuf::from(&config.output_dir).join(format!(
        "{}_{}",
        config.directory_prefix,
        started_at.format("%Y%m%d_%H%M%S")
    ))
}
