//! Console tables for interactive runs.

use std::io::{self, Stdout, Write};

use comfy_table::{Attribute, Cell, Table};

use super::ReportSink;
use crate::compare::{ColumnComparison, RowComparison, TableComparison};
use crate::error::Result;

/// Prints each stage as a table followed by a short summary.
pub struct ConsoleReportSink<W: Write> {
    out: W,
}

impl ConsoleReportSink<Stdout> {
    /// Sink printing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReportSink<W> {
    /// Sink printing to any writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn create_table(headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        table
    }

    fn section(&mut self, title: &str) -> Result<()> {
        writeln!(self.out, "\n{}", title)?;
        writeln!(self.out, "{}", "=".repeat(title.len()))?;
        Ok(())
    }
}

impl<W: Write> ReportSink for ConsoleReportSink<W> {
    fn write_tables(&mut self, tables: &TableComparison) -> Result<()> {
        self.section("Schema Comparison")?;
        if tables.records.is_empty() {
            writeln!(self.out, "No tables found.")?;
            return Ok(());
        }

        let mut table = Self::create_table(&["Table", "Instance 1", "Instance 2", "Difference"]);
        for r in &tables.records {
            table.add_row(vec![
                Cell::new(&r.table),
                Cell::new(r.instance1),
                Cell::new(r.instance2),
                Cell::new(r.difference()),
            ]);
        }
        writeln!(self.out, "{}", table)?;
        writeln!(
            self.out,
            "Only in Instance 1: {}  Only in Instance 2: {}  Common: {}",
            tables.only_in_instance1.len(),
            tables.only_in_instance2.len(),
            tables.common.len()
        )?;
        Ok(())
    }

    fn write_columns(&mut self, columns: &ColumnComparison) -> Result<()> {
        self.section("Column Comparison")?;
        if columns.records.is_empty() {
            writeln!(self.out, "No column differences found.")?;
        } else {
            let mut table = Self::create_table(&["Table", "Column", "Status", "Difference"]);
            for r in &columns.records {
                table.add_row(vec![
                    Cell::new(&r.table),
                    Cell::new(&r.column),
                    Cell::new(r.status),
                    Cell::new(r.difference()),
                ]);
            }
            writeln!(self.out, "{}", table)?;
            writeln!(
                self.out,
                "{} differences in {} of {} tables",
                columns.records.len(),
                columns.tables_with_differences,
                columns.tables_compared
            )?;
        }
        for skipped in &columns.skipped {
            writeln!(self.out, "Skipped {}: {}", skipped.table, skipped.reason)?;
        }
        Ok(())
    }

    fn write_rows(&mut self, rows: &RowComparison) -> Result<()> {
        self.section("Data Comparison")?;
        if rows.records.is_empty() {
            writeln!(self.out, "No data differences found.")?;
        } else {
            let mut table = Self::create_table(&[
                "Table",
                "Primary Key",
                "Status",
                "Column",
                "Value (Instance 1)",
                "Value (Instance 2)",
            ]);
            for r in &rows.records {
                table.add_row(vec![
                    Cell::new(&r.table),
                    Cell::new(&r.primary_key),
                    Cell::new(r.status),
                    Cell::new(&r.column),
                    Cell::new(&r.value1),
                    Cell::new(&r.value2),
                ]);
            }
            writeln!(self.out, "{}", table)?;
            writeln!(
                self.out,
                "{} differences in {} tables",
                rows.records.len(),
                rows.tables_with_differences
            )?;
        }
        for table in rows.tables_without_primary_key() {
            writeln!(
                self.out,
                "Warning: table {} has no primary key, rows not compared",
                table
            )?;
        }
        for (table, reason) in rows.failed_tables() {
            writeln!(self.out, "Failed {}: {}", table, reason)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
