//! mysql-compare CLI - compare a database across two MySQL/MariaDB instances.

use clap::{Parser, Subcommand};
use mysql_compare::config::EXAMPLE_CONFIG;
use mysql_compare::report::{write_report, ReportSink};
use mysql_compare::{CompareError, Config, ConsoleReportSink, Orchestrator};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "mysql-compare")]
#[command(about = "Compare schema and data of a database across two MySQL/MariaDB instances")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full comparison (tables, columns, rows)
    Run {
        /// Override the database compared on both instances
        #[arg(long)]
        database: Option<String>,

        /// Override number of workers
        #[arg(long)]
        workers: Option<usize>,

        /// Only compare tables matching this glob (repeatable)
        #[arg(long = "include", value_name = "PATTERN")]
        include: Vec<String>,

        /// Skip tables matching this glob (repeatable)
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude: Vec<String>,

        /// Override the report output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip the row comparison stage
        #[arg(long)]
        skip_rows: bool,

        /// Skip the column comparison stage
        #[arg(long)]
        skip_columns: bool,
    },

    /// Compare table sets only
    Tables,

    /// Test database connections
    HealthCheck,

    /// Write an example configuration file
    Init {
        /// Output path for configuration file [default: the --config path]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force overwrite existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), CompareError> {
    let cli = Cli::parse();

    // Handle init command separately (doesn't need existing config)
    if let Commands::Init { output, force } = &cli.command {
        let path = output.clone().unwrap_or_else(|| cli.config.clone());
        return write_example_config(&path, *force);
    }

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let cancel_token = setup_signal_handler()?;

    match cli.command {
        Commands::Init { .. } => unreachable!(), // Handled above
        Commands::Run {
            database,
            workers,
            include,
            exclude,
            output_dir,
            skip_rows,
            skip_columns,
        } => {
            // Apply overrides
            if let Some(db) = database {
                config.database = db;
                config.instance1.database = None;
                config.instance2.database = None;
            }
            if let Some(w) = workers {
                config.comparison.workers = w;
            }
            if !include.is_empty() {
                config.comparison.include_tables = include;
            }
            if !exclude.is_empty() {
                config.comparison.exclude_tables = exclude;
            }
            if let Some(dir) = output_dir {
                config.report.output_dir = dir.to_string_lossy().into_owned();
            }
            if skip_rows {
                config.comparison.compare_rows = false;
            }
            if skip_columns {
                config.comparison.compare_columns = false;
            }
            config.validate()?;

            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.run(cancel_token).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                let mut sink = ConsoleReportSink::stdout();
                write_report(&result.report, &mut sink)?;

                println!("\nComparison {}!", result.status);
                println!("  Database: {}", result.report.database);
                println!(
                    "  Duration: {:.2}s",
                    result.report.duration_ms as f64 / 1000.0
                );
                println!(
                    "  Differences: {}",
                    if result.report.has_differences() {
                        "found"
                    } else {
                        "none"
                    }
                );
                for file in &result.report_files {
                    println!("  Report: {}", file.display());
                }
            }
        }

        Commands::Tables => {
            let orchestrator = Orchestrator::new(config).await?;
            let tables = orchestrator.compare_tables().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
            } else {
                let mut sink = ConsoleReportSink::stdout();
                sink.write_tables(&tables)?;
                sink.finish()?;
            }
        }

        Commands::HealthCheck => {
            let result = Orchestrator::health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Instance 1 ({}:{}): {} ({}ms)",
                    config.instance1.host,
                    config.instance1.port,
                    if result.instance1_connected { "OK" } else { "FAILED" },
                    result.instance1_latency_ms
                );
                if let Some(ref err) = result.instance1_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Instance 2 ({}:{}): {} ({}ms)",
                    config.instance2.host,
                    config.instance2.port,
                    if result.instance2_connected { "OK" } else { "FAILED" },
                    result.instance2_latency_ms
                );
                if let Some(ref err) = result.instance2_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(CompareError::connection(
                    "one or more instances",
                    "health check failed",
                ));
            }
        }
    }

    Ok(())
}

fn write_example_config(path: &Path, force: bool) -> Result<(), CompareError> {
    if path.exists() && !force {
        return Err(CompareError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    std::fs::write(path, EXAMPLE_CONFIG)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only reports and JSON
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> Result<CancellationToken, CompareError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => eprintln!("\nReceived SIGINT. Shutting down..."),
            _ = sigterm.recv() => eprintln!("\nReceived SIGTERM. Shutting down..."),
        }
        token.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> Result<CancellationToken, CompareError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Shutting down...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
