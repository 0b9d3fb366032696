//! CSV report files.
//!
//! Each file is rendered in memory, written to a temporary file in the target
//! directory and renamed into place, so a failed run never leaves a partial
//! report behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::info;

use super::ReportSink;
use crate::compare::{ColumnComparison, RowComparison, TableComparison};
use crate::error::{CompareError, Result};

/// Table presence report file name.
pub const SCHEMA_FILE: &str = "1_schema_comparison.csv";
/// Column report file name.
pub const COLUMN_FILE: &str = "2_column_comparison.csv";
/// Row report file name.
pub const DATA_FILE: &str = "3_data_comparison.csv";

const COLUMN_HEADERS: [&str; 14] = [
    "Table",
    "Column",
    "Status",
    "Type (Instance 1)",
    "Null (Instance 1)",
    "Key (Instance 1)",
    "Default (Instance 1)",
    "Extra (Instance 1)",
    "Type (Instance 2)",
    "Null (Instance 2)",
    "Key (Instance 2)",
    "Default (Instance 2)",
    "Extra (Instance 2)",
    "Difference",
];

const ROW_HEADERS: [&str; 7] = [
    "Table",
    "Primary Key",
    "Status",
    "Column",
    "Value (Instance 1)",
    "Value (Instance 2)",
    "Difference",
];

/// Writes the report files into one run directory.
pub struct CsvReportSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvReportSink {
    /// Create a sink for `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Run directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn persist(&mut self, name: &str, content: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| {
            CompareError::Report(format!("Failed to write {}: {}", path.display(), e.error))
        })?;

        info!("Report saved to: {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

fn render<I, R>(headers: &[&str], records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for record in records {
        writer.write_record(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| CompareError::Report(e.to_string()))
}

impl ReportSink for CsvReportSink {
    fn write_tables(&mut self, tables: &TableComparison) -> Result<()> {
        if tables.records.is_empty() {
            return Ok(());
        }
        let content = render(
            &["Table", "Instance 1", "Instance 2", "Difference"],
            tables.records.iter().map(|r| {
                [
                    r.table.clone(),
                    r.instance1.to_string(),
                    r.instance2.to_string(),
                    r.difference().to_string(),
                ]
            }),
        )?;
        self.persist(SCHEMA_FILE, &content)
    }

    fn write_columns(&mut self, columns: &ColumnComparison) -> Result<()> {
        if columns.records.is_empty() {
            return Ok(());
        }
        let content = render(
            &COLUMN_HEADERS,
            columns.records.iter().map(|r| {
                [
                    r.table.clone(),
                    r.column.clone(),
                    r.status.to_string(),
                    r.instance1.type_label(),
                    r.instance1.null_label(),
                    r.instance1.key_label(),
                    r.instance1.default_label(),
                    r.instance1.extra_label(),
                    r.instance2.type_label(),
                    r.instance2.null_label(),
                    r.instance2.key_label(),
                    r.instance2.default_label(),
                    r.instance2.extra_label(),
                    r.difference(),
                ]
            }),
        )?;
        self.persist(COLUMN_FILE, &content)
    }

    fn write_rows(&mut self, rows: &RowComparison) -> Result<()> {
        if rows.records.is_empty() {
            return Ok(());
        }
        let content = render(
            &ROW_HEADERS,
            rows.records.iter().map(|r| {
                [
                    r.table.clone(),
                    r.primary_key.clone(),
                    r.status.to_string(),
                    r.column.clone(),
                    r.value1.clone(),
                    r.value2.clone(),
                    r.difference(),
                ]
            }),
        )?;
        self.persist(DATA_FILE, &content)
    }

    fn finish(&mut self) -> Result<()> {
        if !self.written.is_empty() {
            info!(
                "{} report files written to {}",
                self.written.len(),
                self.dir.display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare_table_sets, RowDifference};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schema_file_written() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("run");
        let mut sink = CsvReportSink::new(&dir);

        let tables = compare_table_sets(&names(&["users", "orders"]), &names(&["users"]));
        sink.write_tables(&tables).unwrap();
        sink.finish().unwrap();

        let content = std::fs::read_to_string(dir.join(SCHEMA_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Table,Instance 1,Instance 2,Difference",
                "orders,Present,Missing,Table missing in Instance 2",
                "users,Present,Present,None",
            ]
        );
        assert_eq!(sink.written().len(), 1);
    }

    #[test]
    fn test_empty_column_and_row_files_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = CsvReportSink::new(tmp.path());

        sink.write_columns(&ColumnComparison::default()).unwrap();
        sink.write_rows(&RowComparison::default()).unwrap();

        assert!(sink.written().is_empty());
        assert!(!tmp.path().join(COLUMN_FILE).exists());
        assert!(!tmp.path().join(DATA_FILE).exists());
    }

    #[test]
    fn test_no_schema_file_without_tables() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("run");
        let mut sink = CsvReportSink::new(&dir);

        sink.write_tables(&compare_table_sets(&[], &[])).unwrap();
        sink.finish().unwrap();

        assert!(sink.written().is_empty());
        assert!(!dir.join(SCHEMA_FILE).exists());
    }

    #[test]
    fn test_row_file_quotes_composite_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = CsvReportSink::new(tmp.path());

        let rows = RowComparison {
            records: vec![RowDifference::only_in_instance2("stock", "eu, 9".to_string())],
            ..Default::default()
        };
        sink.write_rows(&rows).unwrap();

        let content = std::fs::read_to_string(tmp.path().join(DATA_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], ROW_HEADERS.join(","));
        assert_eq!(
            lines[1],
            "stock,\"eu, 9\",Only in Instance 2,ALL,Missing,Exists,Row missing in Instance 1"
        );
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sink = CsvReportSink::new(tmp.path());
        sink.write_tables(&compare_table_sets(&names(&["a"]), &names(&["a"])))
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(SCHEMA_FILE)]);
    }
}
