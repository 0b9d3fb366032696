//! Configuration type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Accepted `ssl_mode` values, mirroring the MySQL client modes.
pub const SSL_MODES: &[&str] = &[
    "disabled",
    "preferred",
    "required",
    "verify_ca",
    "verify_identity",
];

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database compared on both instances, unless an instance overrides it.
    pub database: String,

    /// First instance.
    pub instance1: InstanceConfig,

    /// Second instance.
    pub instance2: InstanceConfig,

    /// Comparison behavior.
    #[serde(default)]
    pub comparison: ComparisonConfig,

    /// Report output.
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Database name used on instance 1.
    pub fn database1(&self) -> &str {
        self.instance1.database.as_deref().unwrap_or(&self.database)
    }

    /// Database name used on instance 2.
    pub fn database2(&self) -> &str {
        self.instance2.database.as_deref().unwrap_or(&self.database)
    }
}

/// Connection settings for one MySQL/MariaDB instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Database name override for this instance.
    #[serde(default)]
    pub database: Option<String>,

    /// SSL mode (default: "preferred").
    #[serde(default = "default_preferred")]
    pub ssl_mode: String,
}

impl fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Comparison behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Tables compared concurrently per stage (default: 4).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Glob patterns of tables to include (empty = all).
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Glob patterns of tables to exclude.
    #[serde(default)]
    pub exclude_tables: Vec<String>,

    /// Compare views as tables (default: false).
    #[serde(default)]
    pub include_views: bool,

    /// Run the column stage (default: true).
    #[serde(default = "default_true")]
    pub compare_columns: bool,

    /// Run the row stage (default: true).
    #[serde(default = "default_true")]
    pub compare_rows: bool,

    /// Pool size per instance (default: 4).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            include_views: false,
            compare_columns: true,
            compare_rows: true,
            max_connections: default_max_connections(),
        }
    }
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Parent directory of the per-run report directory (default: ".").
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Prefix of the per-run directory name.
    #[serde(default = "default_directory_prefix")]
    pub directory_prefix: String,

    /// Write CSV files (default: true).
    #[serde(default = "default_true")]
    pub write_csv: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            directory_prefix: default_directory_prefix(),
            write_csv: true,
        }
    }
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_preferred() -> String {
    "preferred".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_max_connections() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_directory_prefix() -> String {
    "db_comparison_reports".to_string()
}
