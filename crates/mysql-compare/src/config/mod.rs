//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::compare::{CompareOptions, TableFilter};
use crate::error::Result;
use std::path::Path;

/// Commented example written by `init`.
pub const EXAMPLE_CONFIG: &str = r#"# Database compared on both instances.
database: shop

instance1:
  host: db1.example.com
  port: 3306
  user: compare
  password: changeme
  ssl_mode: preferred

instance2:
  host: db2.example.com
  port: 3306
  user: compare
  password: changeme
  # database: shop_replica   # per-instance override
  ssl_mode: preferred

comparison:
  workers: 4                 # tables compared concurrently per stage
  include_tables: []         # glob patterns (* and ?), empty = all tables
  exclude_tables: []
  include_views: false
  compare_columns: true
  compare_rows: true         # tables without a primary key are skipped
  max_connections: 4         # pool size per instance

report:
  output_dir: "."
  directory_prefix: db_comparison_reports
  write_csv: true
"#;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Engine options derived from the comparison section.
    pub fn compare_options(&self) -> Result<CompareOptions> {
        Ok(CompareOptions {
            workers: self.comparison.workers,
            compare_columns: self.comparison.compare_columns,
            compare_rows: self.comparison.compare_rows,
            filter: TableFilter::new(
                &self.comparison.include_tables,
                &self.comparison.exclude_tables,
            )?,
        })
    }
}
