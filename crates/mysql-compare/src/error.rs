//! Error types for the comparison library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection failures.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code for metadata or data errors that escaped the table boundary.
pub const EXIT_QUERY_ERROR: u8 = 3;
/// Exit code for report writing failures.
pub const EXIT_REPORT_ERROR: u8 = 4;
/// Exit code for a cancelled run.
pub const EXIT_CANCELLED: u8 = 5;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for comparison operations.
#[derive(Error, Debug)]
pub enum CompareError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Could not connect to one of the instances. Fatal for the whole run.
    #[error("Connection to {instance} failed: {message}")]
    Connection { instance: String, message: String },

    /// Metadata query failed for a table. Skips the affected table and stage.
    #[error("Metadata error on {instance} for table {table}: {message}")]
    Metadata {
        instance: String,
        table: String,
        message: String,
    },

    /// Row fetch failed for a table. Skips row comparison for that table.
    #[error("Data fetch failed on {instance} for table {table}: {message}")]
    DataFetch {
        instance: String,
        table: String,
        message: String,
    },

    /// Report rendering or persistence failed.
    #[error("Report error: {0}")]
    Report(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Comparison was cancelled (SIGINT, etc.)
    #[error("Comparison cancelled")]
    Cancelled,
}

impl CompareError {
    /// Create a Connection error for the given instance label.
    pub fn connection(instance: impl ToString, message: impl ToString) -> Self {
        CompareError::Connection {
            instance: instance.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a Metadata error.
    pub fn metadata(
        instance: impl ToString,
        table: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        CompareError::Metadata {
            instance: instance.to_string(),
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a DataFetch error.
    pub fn data_fetch(
        instance: impl ToString,
        table: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        CompareError::DataFetch {
            instance: instance.to_string(),
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CompareError::Metadata { .. } | CompareError::DataFetch { .. }
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CompareError::Config(_) | CompareError::Yaml(_) => EXIT_CONFIG_ERROR,
            CompareError::Connection { .. } => EXIT_CONNECTION_ERROR,
            CompareError::Metadata { .. } | CompareError::DataFetch { .. } => EXIT_QUERY_ERROR,
            CompareError::Report(_) | CompareError::Json(_) | CompareError::Csv(_) => {
                EXIT_REPORT_ERROR
            }
            CompareError::Cancelled => EXIT_CANCELLED,
            CompareError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for comparison operations.
pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_fatal_errors() {
        assert!(!CompareError::metadata("Instance 1", "users", "boom").is_fatal());
        assert!(!CompareError::data_fetch("Instance 2", "users", "boom").is_fatal());
        assert!(CompareError::connection("Instance 1", "refused").is_fatal());
        assert!(CompareError::Config("bad".into()).is_fatal());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CompareError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            CompareError::connection("Instance 1", "x").exit_code(),
            EXIT_CONNECTION_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(CompareError::from(io).exit_code(), EXIT_IO_ERROR);
        assert_eq!(CompareError::Cancelled.exit_code(), EXIT_CANCELLED);
    }

    #[test]
    fn test_metadata_message_names_table() {
        let err = CompareError::metadata("Instance 2", "orders", "table doesn't exist");
        assert_eq!(
            err.to_string(),
            "Metadata error on Instance 2 for table orders: table doesn't exist"
        );
    }
}
