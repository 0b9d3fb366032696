//! # mysql-compare
//!
//! Compare the same logical database deployed on two MySQL/MariaDB instances
//! and report every structural and content divergence between them:
//!
//! - **Tables** present on only one instance
//! - **Columns** that differ in type, nullability, key role, default or extra
//!   attributes
//! - **Rows** missing on one side or differing cell by cell, joined on the
//!   primary key
//!
//! The comparison engine is generic over [`MetadataProvider`] and
//! [`DataProvider`]; [`drivers::MysqlProvider`] is the production
//! implementation. Reports are rendered through a [`report::ReportSink`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_compare::{Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> mysql_compare::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run(CancellationToken::new()).await?;
//!     println!("{} differences", result.report.records().len());
//!     Ok(())
//! }
//! ```

pub mod compare;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod report;

// Re-exports for convenient access
pub use compare::{CompareEngine, CompareOptions, CompareReport, DifferenceRecord, TableFilter};
pub use config::{ComparisonConfig, Config, InstanceConfig, ReportConfig};
pub use crate::core::{
    format_key, normalize_value, values_equal, ColumnDescriptor, DataProvider, Instance,
    MetadataProvider, PrimaryKeySpec, RowKey, RowSnapshot, SqlValue, TableRows,
};
pub use error::{CompareError, Result};
pub use orchestrator::{HealthCheckResult, Orchestrator, RunResult};
pub use report::{ConsoleReportSink, CsvReportSink, ReportSink};
