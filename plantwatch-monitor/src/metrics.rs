// Plantwatch Monitor - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus metrics for the monitoring loop.
//!
//! Metrics are registered in the default registry and exported as a
//! node-exporter style textfile, rewritten after every tick and rollup.

use lazy_static::lazy_static;
use plantwatch::{Alert, DailySummary, MonitorError, ProcessedRecord, RollupOutput, TickObserver};
use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Encoder, Gauge,
    TextEncoder,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

lazy_static! {
    // ============================================================
    // Latest record
    // ============================================================

    /// Sum of power meter readings (kW).
    pub static ref TOTAL_POWER_KW: Gauge = register_gauge!(
        "plantwatch_total_power_kw",
        "Total power consumption of the latest record in kW"
    ).unwrap();

    /// Mean power per meter (kW).
    pub static ref AVERAGE_POWER_KW: Gauge = register_gauge!(
        "plantwatch_average_power_kw",
        "Average power per meter of the latest record in kW"
    ).unwrap();

    pub static ref AVERAGE_TEMPERATURE_CELSIUS: Gauge = register_gauge!(
        "plantwatch_average_temperature_celsius",
        "Average temperature of the latest record in degrees Celsius"
    ).unwrap();

    pub static ref TOTAL_FLOW: Gauge = register_gauge!(
        "plantwatch_total_flow",
        "Total flow of the latest record in cubic meters per hour"
    ).unwrap();

    pub static ref EFFICIENCY: Gauge = register_gauge!(
        "plantwatch_efficiency",
        "Efficiency ratio of the latest record"
    ).unwrap();

    // ============================================================
    // Event Counters
    // ============================================================

    /// Fired alerts, labeled by alert kind.
    pub static ref ALERTS_TOTAL: CounterVec = register_counter_vec!(
        "plantwatch_alerts_total",
        "Total threshold alerts fired",
        &["kind"]
    ).unwrap();

    pub static ref TICKS_TOTAL: Counter = register_counter!(
        "plantwatch_ticks_total",
        "Total collection ticks attempted"
    ).unwrap();

    pub static ref TICK_ERRORS_TOTAL: Counter = register_counter!(
        "plantwatch_tick_errors_total",
        "Total collection ticks that produced no record"
    ).unwrap();

    pub static ref ROLLUPS_TOTAL: Counter = register_counter!(
        "plantwatch_rollups_total",
        "Total rollups published"
    ).unwrap();

    // ============================================================
    // Last rollup
    // ============================================================

    pub static ref LAST_ROLLUP_ENERGY_KWH: Gauge = register_gauge!(
        "plantwatch_last_rollup_energy_kwh",
        "Estimated energy of the last rollup in kWh"
    ).unwrap();

    pub static ref LAST_ROLLUP_COST: Gauge = register_gauge!(
        "plantwatch_last_rollup_cost",
        "Energy cost of the last rollup"
    ).unwrap();
}

/// Metrics export failures.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Prometheus encoding failed: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics text is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Update the latest-record gauges.
pub fn update_record_metrics(record: &ProcessedRecord) {
    let metrics = &record.metrics;
    TOTAL_POWER_KW.set(metrics.total_power_consumption);
    AVERAGE_POWER_KW.set(metrics.average_power);
    AVERAGE_TEMPERATURE_CELSIUS.set(metrics.average_temperature);
    TOTAL_FLOW.set(metrics.total_flow);
    EFFICIENCY.set(metrics.efficiency);
}

/// Increment the alert counter of each fired alert.
pub fn record_alerts(alerts: &[Alert]) {
    for alert in alerts {
        ALERTS_TOTAL.with_label_values(&[alert.kind()]).inc();
    }
}

/// Update the last-rollup gauges.
pub fn update_rollup_metrics(summary: &DailySummary) {
    ROLLUPS_TOTAL.inc();
    LAST_ROLLUP_ENERGY_KWH.set(summary.total_energy_consumed);
    LAST_ROLLUP_COST.set(summary.total_cost);
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> Result<String, MetricsError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Write the metrics textfile. The file is replaced atomically so a
/// scraper never reads a partial file.
pub fn write_textfile(path: &Path) -> Result<(), MetricsError> {
    let text = encode_metrics()?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, text)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Observer feeding the Prometheus metrics and rewriting the textfile.
pub struct PrometheusObserver {
    path: PathBuf,
}

impl PrometheusObserver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn flush(&self) {
        if let Err(e) = write_textfile(&self.path) {
            warn!("Failed to write metrics to {}: {}", self.path.display(), e);
        }
    }
}

impl TickObserver for PrometheusObserver {
    fn on_record(&mut self, record: &ProcessedRecord) {
        TICKS_TOTAL.inc();
        update_record_metrics(record);
        self.flush();
    }

    fn on_alerts(&mut self, alerts: &[Alert]) {
        record_alerts(alerts);
        self.flush();
    }

    fn on_tick_error(&mut self, _error: &MonitorError) {
        TICKS_TOTAL.inc();
        TICK_ERRORS_TOTAL.inc();
        self.flush();
    }

    fn on_rollup(&mut self, summary: &DailySummary, _output: &RollupOutput) {
        update_rollup_metrics(summary);
        self.flush();
    }
}
