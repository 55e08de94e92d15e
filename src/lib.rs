//! # Plantwatch - Plant energy monitoring
//!
//! Periodic collection of power, temperature and flow readings, with
//! derived efficiency metrics, threshold alerts and daily reports.
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────┐   ┌───────────┐   ┌──────────┐   ┌────────────┐
//! │ReadingSource │──▶│ Collector │──▶│ Analyzer │──▶│  Monitor   │
//! │ (simulated / │   │ Snapshot  │   │ Record + │   │ buffer +   │
//! │  replayed)   │   └───────────┘   │ Alerts   │   │ rollups    │
//! └──────────────┘                   └──────────┘   └─────┬──────┘
//!                                                         ▼
//!                                              ┌───────────────────┐
//!                                              │ ReportSink        │
//!                                              │ CSV + PNG charts  │
//!                                              └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use plantwatch::{Analyzer, Collector, MonitorConfig, SimulatedSource};
//!
//! let config = MonitorConfig::default();
//! let mut collector = Collector::new(
//!     config.sensors.registry.clone(),
//!     SimulatedSource::with_seed(42),
//! );
//! let analyzer = Analyzer::new(config.thresholds, config.energy, config.sensors.interval());
//!
//! let snapshot = collector.collect().unwrap();
//! let record = analyzer.process(&snapshot).unwrap();
//! for alert in analyzer.check_alerts(&record) {
//!     println!("{}", alert);
//! }
//! ```
//!
//! ## Running the loop
//!
//! ```rust,no_run
//! use plantwatch::{FileReporter, Monitor, MonitorConfig, SimulatedSource};
//!
//! # async fn example() -> plantwatch::Result<()> {
//! let config = MonitorConfig::default();
//! let reporter = FileReporter::new(&config.report);
//! let mut monitor = Monitor::new(&config, SimulatedSource::new(), reporter)?;
//!
//! let handle = monitor.handle();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     handle.shutdown();
//! });
//!
//! // Returns after the final rollup.
//! monitor.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `charts` (default): PNG rendering through `plotters`.

pub mod analyzer;
pub mod collector;
pub mod config;
pub mod error;
pub mod monitor;
pub mod registry;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod summary;

#[cfg(feature = "charts")]
pub mod visualizer;

// Re-exports for convenience
pub use analyzer::{Alert, Analyzer, Metrics, ProcessedRecord};
pub use collector::Collector;
pub use config::{
    AlertThresholds, EnergyConfig, MonitorConfig, ReportCadence, ReportConfig, SensorConfig,
};
pub use error::{DataQualityError, MonitorError, ReadError, Result};
pub use monitor::{
    Clock, Monitor, MonitorHandle, MonitorPhase, MonitorState, NoopObserver, SystemClock,
    TickObserver,
};
pub use registry::{SensorGroup, SensorKind, SensorRegistry};
pub use report::{FileReporter, ReportSink, RollupOutput};
pub use snapshot::{GroupReadings, Snapshot};
pub use source::{ReadingSource, ReplaySource, SensorClass, SimulatedSource};
pub use summary::{read_summary_csv, write_summary_csv, DailySummary};

#[cfg(feature = "charts")]
pub use visualizer::Visualizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
