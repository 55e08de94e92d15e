// Plantwatch Monitor - Command-line plant energy monitor
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Plantwatch Monitor
//!
//! Runs the collect → analyze → alert → report loop until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! # Simulated sensors, default plant settings
//! plantwatch-monitor
//!
//! # Custom settings, one tick per minute, Prometheus textfile
//! plantwatch-monitor --config plant.json --interval-secs 60 \
//!     --metrics-file /var/lib/node_exporter/plantwatch.prom
//!
//! # Replay a recording
//! plantwatch-monitor --replay recording.csv run
//!
//! # One-off helpers
//! plantwatch-monitor analyze-sample
//! plantwatch-monitor render-sample --days 7
//! ```

mod metrics;
mod sample;

use chrono::{Duration as ChronoDuration, Local};
use clap::{Parser, Subcommand};
use metrics::{MetricsError, PrometheusObserver};
use plantwatch::{
    Alert, Analyzer, Collector, FileReporter, Metrics, Monitor, MonitorConfig, MonitorError,
    MonitorHandle, ReadingSource, ReplaySource, SimulatedSource, Visualizer,
};
use sample::{sample_snapshot, SyntheticDay};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Plant energy monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (defaults to the built-in plant settings)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for CSV summaries and charts
    #[arg(short, long)]
    reports_dir: Option<PathBuf>,

    /// Seconds between collection ticks
    #[arg(short, long)]
    interval_secs: Option<u64>,

    /// Seed for simulated readings and synthetic data
    #[arg(long)]
    seed: Option<u64>,

    /// Replay readings from a recorded CSV instead of simulating them
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Stop with read errors at the end of the recording instead of looping
    #[arg(long)]
    no_loop: bool,

    /// Prometheus textfile rewritten after every tick
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Write CSV summaries only
    #[arg(long)]
    no_charts: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the monitoring loop until Ctrl-C (default)
    Run,
    /// Collect and log snapshots only, without analysis or reports
    Collect,
    /// Analyze the reference snapshot and print metrics and alerts as JSON
    AnalyzeSample,
    /// Render the charts for synthetic data
    RenderSample {
        /// Days of hourly data for the summary chart
        #[arg(long, default_value = "7")]
        days: usize,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Plantwatch Monitor v{}", env!("CARGO_PKG_VERSION"));

    match dispatch(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;

    match args.command {
        None | Some(Command::Run) => run_monitor(&args, &config).await,
        Some(Command::Collect) => collect_only(&args, &config).await,
        Some(Command::AnalyzeSample) => analyze_sample(&config),
        Some(Command::RenderSample { days }) => render_sample(&args, &config, days),
    }
}

/// Configuration file (or defaults) with command-line overrides applied.
fn load_config(args: &Args) -> Result<MonitorConfig, MonitorError> {
    let mut config = match args.config {
        Some(ref path) => {
            info!("Loading configuration from {}", path.display());
            MonitorConfig::from_json_file(path)?
        }
        None => MonitorConfig::default(),
    };

    if let Some(ref dir) = args.reports_dir {
        config.report.reports_dir = dir.clone();
    }
    if let Some(secs) = args.interval_secs {
        config.sensors.collection_interval_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

fn reading_source(args: &Args) -> Result<Box<dyn ReadingSource>, MonitorError> {
    match args.replay {
        Some(ref path) => Ok(Box::new(ReplaySource::from_csv(path, !args.no_loop)?)),
        None => {
            let source = match args.seed {
                Some(seed) => SimulatedSource::with_seed(seed),
                None => SimulatedSource::new(),
            };
            Ok(Box::new(source))
        }
    }
}

/// Request shutdown of `handle` on Ctrl-C.
fn shutdown_on_ctrl_c(handle: MonitorHandle) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                handle.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

async fn run_monitor(args: &Args, config: &MonitorConfig) -> Result<(), CliError> {
    let handle = MonitorHandle::new();
    shutdown_on_ctrl_c(handle.clone());

    let mut reporter = FileReporter::new(&config.report);
    if args.no_charts {
        reporter = reporter.without_charts();
    }

    let mut monitor = Monitor::new(config, reading_source(args)?, reporter)?.with_handle(handle);
    if let Some(ref path) = args.metrics_file {
        info!("Writing Prometheus metrics to {}", path.display());
        metrics::write_textfile(path)?;
        monitor = monitor.with_observer(PrometheusObserver::new(path));
    }

    info!(
        "Reports go to {} ({:?} rollups)",
        config.report.reports_dir.display(),
        config.report.cadence
    );
    monitor.run().await;
    Ok(())
}

async fn collect_only(args: &Args, config: &MonitorConfig) -> Result<(), CliError> {
    let handle = MonitorHandle::new();
    shutdown_on_ctrl_c(handle.clone());

    let mut collector = Collector::new(config.sensors.registry.clone(), reading_source(args)?);
    collector
        .run_continuous(config.sensors.interval(), &handle, |_| {})
        .await;
    Ok(())
}

#[derive(Serialize)]
struct SampleAnalysis {
    metrics: Metrics,
    alerts: Vec<Alert>,
    messages: Vec<String>,
}

fn analyze_sample(config: &MonitorConfig) -> Result<(), CliError> {
    let analyzer = Analyzer::new(config.thresholds, config.energy, config.sensors.interval());
    let record = analyzer.process(&sample_snapshot(Local::now()))?;
    let alerts = analyzer.check_alerts(&record);

    let report = SampleAnalysis {
        metrics: record.metrics,
        messages: alerts.iter().map(|a| a.to_string()).collect(),
        alerts,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn render_sample(args: &Args, config: &MonitorConfig, days: usize) -> Result<(), CliError> {
    let start = Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .unwrap_or_else(Local::now);
    let mut synthetic = SyntheticDay::new(args.seed, config.energy.efficiency_factor);
    let records = synthetic.records(start, ChronoDuration::hours(1), 24);

    let hourly = Analyzer::new(config.thresholds, config.energy, Duration::from_secs(3600));
    let summaries = synthetic.summaries(&hourly, start, days.max(1), 24)?;

    std::fs::create_dir_all(&config.report.reports_dir).map_err(MonitorError::from)?;
    let visualizer = Visualizer::new(config.report.reports_dir.clone());
    let charts = [
        visualizer.plot_power_consumption(&records, "sample_power_consumption")?,
        visualizer.plot_efficiency_trends(&records, "sample_efficiency_trends")?,
        visualizer.plot_daily_summaries(&summaries, "sample_daily_summary")?,
    ];

    for chart in &charts {
        info!("Rendered {}", chart.display());
    }
    Ok(())
}
