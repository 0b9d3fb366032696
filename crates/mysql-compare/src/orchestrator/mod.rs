//! Comparison orchestrator - main workflow coordinator.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::compare::{CompareEngine, CompareReport, TableComparison};
use crate::config::Config;
use crate::core::Instance;
use crate::drivers::{MysqlProvider, MysqlReader};
use crate::error::{CompareError, Result};
use crate::report::{run_directory, write_report, CsvReportSink};

/// Comparison orchestrator.
pub struct Orchestrator {
    config: Config,
    provider: Arc<MysqlProvider>,
}

/// Result of a comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Final status.
    pub status: String,

    /// Everything the comparison found.
    pub report: CompareReport,

    /// Report files written for this run.
    pub report_files: Vec<PathBuf>,
}

impl RunResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Connectivity of both instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub instance1_connected: bool,
    pub instance1_latency_ms: u64,
    pub instance1_error: Option<String>,
    pub instance2_connected: bool,
    pub instance2_latency_ms: u64,
    pub instance2_error: Option<String>,
    pub healthy: bool,
}

impl Orchestrator {
    /// Create a new orchestrator, connecting to both instances.
    pub async fn new(config: Config) -> Result<Self> {
        let provider = MysqlProvider::connect(&config).await.map_err(|e| {
            error!("{}", e);
            e
        })?;
        Ok(Self {
            config,
            provider: Arc::new(provider),
        })
    }

    fn engine(&self) -> Result<CompareEngine<MysqlProvider>> {
        Ok(CompareEngine::new(
            self.provider.clone(),
            self.config.compare_options()?,
        ))
    }

    /// Run the full comparison and write the configured reports.
    ///
    /// Connection pools are closed when this returns, on success or failure.
    pub async fn run(self, cancel: CancellationToken) -> Result<RunResult> {
        let result = self.run_inner(&cancel).await;
        self.provider.close().await;

        match &result {
            Ok(r) => info!("Comparison {}", r.status),
            Err(CompareError::Cancelled) => warn!("Comparison cancelled"),
            Err(e) => error!("Comparison failed: {}", e),
        }
        result
    }

    async fn run_inner(&self, cancel: &CancellationToken) -> Result<RunResult> {
        let engine = self.engine()?;
        let database = self.config.database1().to_string();

        let report = tokio::select! {
            _ = cancel.cancelled() => return Err(CompareError::Cancelled),
            report = engine.run(&database, cancel) => report?,
        };

        let mut report_files = Vec::new();
        if self.config.report.write_csv {
            let dir = run_directory(&self.config.report, report.started_at);
            let mut sink = CsvReportSink::new(dir);
            write_report(&report, &mut sink)?;
            report_files = sink.written().to_vec();
        }

        let skipped = report
            .columns
            .as_ref()
            .map(|c| c.skipped.len())
            .unwrap_or(0)
            + report
                .rows
                .as_ref()
                .map(|r| r.tables.iter().filter(|t| !t.outcome.is_compared()).count())
                .unwrap_or(0);
        let status = if skipped == 0 {
            "completed".to_string()
        } else {
            format!("completed ({} table stages skipped)", skipped)
        };

        Ok(RunResult {
            status,
            report,
            report_files,
        })
    }

    /// Run only the table set stage.
    pub async fn compare_tables(self) -> Result<TableComparison> {
        let result = match self.engine() {
            Ok(engine) => Ok(engine.compare_tables().await),
            Err(e) => Err(e),
        };
        self.provider.close().await;
        result
    }

    /// Connect to each instance independently and measure latency.
    ///
    /// Never fails on connection errors; they are reported per instance.
    pub async fn health_check(config: &Config) -> HealthCheckResult {
        async fn check_instance(
            instance: Instance,
            config: &Config,
        ) -> std::result::Result<u64, String> {
            let (instance_config, database) = match instance {
                Instance::One => (&config.instance1, config.database1()),
                Instance::Two => (&config.instance2, config.database2()),
            };
            let reader = MysqlReader::new(instance, instance_config, database, 1)
                .await
                .map_err(|e| e.to_string())?;
            let latency = reader.latency().await.map_err(|e| e.to_string());
            reader.close().await;
            latency.map(|d| d.as_millis() as u64)
        }

        let (r1, r2) = futures::join!(
            check_instance(Instance::One, config),
            check_instance(Instance::Two, config)
        );

        let instance1_connected = r1.is_ok();
        let instance2_connected = r2.is_ok();
        HealthCheckResult {
            instance1_connected,
            instance1_latency_ms: *r1.as_ref().unwrap_or(&0),
            instance1_error: r1.err(),
            instance2_connected,
            instance2_latency_ms: *r2.as_ref().unwrap_or(&0),
            instance2_error: r2.err(),
            healthy: instance1_connected && instance2_connected,
        }
    }
}
