// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Monitoring loop.
//!
//! The [`Monitor`] owns the record buffer and drives the
//! collect → process → alert → rollup cycle:
//!
//! ```text
//!             tick ok / tick failed
//!              ┌──────┐
//!              ▼      │
//! ┌──────┐ ┌─────────────┐  period elapsed  ┌────────┐
//! │ Idle │▶│   Running   │ ───────────────▶ │ rollup │ ──┐
//!          └─────────────┘ ◀─────────────── └────────┘   │
//!                 │ shutdown()               buffer cleared
//!                 ▼
//!          ┌──────────────┐  final rollup  ┌─────────┐
//!          │ ShuttingDown │ ─────────────▶ │ Stopped │
//!          └──────────────┘                └─────────┘
//! ```
//!
//! A monitor is `Idle` until `run` is called. Shutdown is requested
//! through a [`MonitorHandle`] and observed only at
//! tick boundaries. The interval sleep wakes up early when shutdown is
//! requested. `run` returns after exactly one final rollup attempt.

use crate::analyzer::{Alert, Analyzer, ProcessedRecord};
use crate::collector::Collector;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::report::{ReportSink, RollupOutput};
use crate::source::ReadingSource;
use crate::summary::DailySummary;
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

/// Source of wall-clock time.
pub trait Clock {
    /// Current local time.
    fn now(&self) -> DateTime<Local>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Lifecycle phase of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// Constructed, `run` not called yet.
    Idle,
    /// Polling loop active.
    Running,
    /// Final rollup in progress.
    ShuttingDown,
    /// `run` has returned.
    Stopped,
}

/// Counters and flags shared between a monitor and its handles.
#[derive(Debug, Default)]
pub struct MonitorState {
    /// Whether the polling loop is active.
    pub running: AtomicBool,
    /// Ticks attempted.
    pub ticks: AtomicUsize,
    /// Ticks that failed to produce a record.
    pub failed_ticks: AtomicUsize,
    /// Rollups published.
    pub rollups: AtomicUsize,
    shutdown: AtomicBool,
    wake: Notify,
}

/// Cloneable handle used to observe and stop a running loop.
#[derive(Debug, Clone, Default)]
pub struct MonitorHandle {
    state: Arc<MonitorState>,
}

impl MonitorHandle {
    /// Create a fresh handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. The loop finishes its current tick, performs the
    /// final rollup and returns.
    pub fn shutdown(&self) {
        self.state.shutdown.store(true, Ordering::SeqCst);
        self.state.wake.notify_one();
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.state.shutdown.load(Ordering::SeqCst)
    }

    /// Whether the polling loop is active.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Ticks attempted so far.
    pub fn ticks(&self) -> usize {
        self.state.ticks.load(Ordering::SeqCst)
    }

    /// Ticks that failed so far.
    pub fn failed_ticks(&self) -> usize {
        self.state.failed_ticks.load(Ordering::SeqCst)
    }

    /// Rollups published so far.
    pub fn rollups(&self) -> usize {
        self.state.rollups.load(Ordering::SeqCst)
    }

    /// Shared state.
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Sleep for `interval`, returning early if shutdown is requested.
    pub async fn sleep_or_shutdown(&self, interval: Duration) {
        if self.is_shutdown_requested() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = self.state.wake.notified() => {}
        }
    }
}

/// Hooks called by the monitor as it runs. All methods default to no-ops.
pub trait TickObserver {
    /// A snapshot was processed into a record.
    fn on_record(&mut self, _record: &ProcessedRecord) {}

    /// Alerts fired for the latest record. Not called when none fired.
    fn on_alerts(&mut self, _alerts: &[Alert]) {}

    /// A tick failed before producing a record.
    fn on_tick_error(&mut self, _error: &MonitorError) {}

    /// A rollup was published.
    fn on_rollup(&mut self, _summary: &DailySummary, _output: &RollupOutput) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TickObserver for NoopObserver {}

/// The monitoring loop.
pub struct Monitor<S, R, C = SystemClock> {
    collector: Collector<S>,
    analyzer: Analyzer,
    sink: R,
    clock: C,
    observer: Box<dyn TickObserver>,
    interval: Duration,
    rollup_period: chrono::Duration,
    daily_data: Vec<ProcessedRecord>,
    window_start: DateTime<Local>,
    phase: MonitorPhase,
    handle: MonitorHandle,
}

impl<S: ReadingSource, R: ReportSink> Monitor<S, R, SystemClock> {
    /// Create a monitor on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidConfig`] if the configuration does
    /// not validate.
    pub fn new(config: &MonitorConfig, source: S, sink: R) -> Result<Self> {
        config.validate()?;

        let interval = config.sensors.interval();
        let clock = SystemClock;
        Ok(Self {
            collector: Collector::new(config.sensors.registry.clone(), source),
            analyzer: Analyzer::new(config.thresholds, config.energy, interval),
            sink,
            window_start: clock.now(),
            clock,
            observer: Box::new(NoopObserver),
            interval,
            rollup_period: config.report.cadence.period(),
            daily_data: Vec::new(),
            phase: MonitorPhase::Idle,
            handle: MonitorHandle::new(),
        })
    }
}

impl<S: ReadingSource, R: ReportSink, C: Clock> Monitor<S, R, C> {
    /// Replace the clock. The rollup window restarts at the new clock's
    /// current time.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Monitor<S, R, C2> {
        Monitor {
            collector: self.collector,
            analyzer: self.analyzer,
            sink: self.sink,
            window_start: clock.now(),
            clock,
            observer: self.observer,
            interval: self.interval,
            rollup_period: self.rollup_period,
            daily_data: self.daily_data,
            phase: self.phase,
            handle: self.handle,
        }
    }

    /// Install an observer.
    pub fn with_observer(mut self, observer: impl TickObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Override the sleep between ticks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Share an existing handle, e.g. one already wired to a signal.
    pub fn with_handle(mut self, handle: MonitorHandle) -> Self {
        self.handle = handle;
        self
    }

    /// Handle for stopping and observing this monitor.
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// Current phase.
    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    /// Records buffered since the last rollup, oldest first.
    pub fn buffered(&self) -> &[ProcessedRecord] {
        &self.daily_data
    }

    /// Analyzer in use.
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Report sink.
    pub fn sink(&self) -> &R {
        &self.sink
    }

    /// Run the loop until shutdown is requested, then perform the final
    /// rollup.
    pub async fn run(&mut self) {
        info!(
            "Starting Energy Monitoring System: {} sensors every {:?}",
            self.collector.registry().sensor_count(),
            self.interval
        );
        self.phase = MonitorPhase::Running;
        self.handle.state.running.store(true, Ordering::SeqCst);

        while !self.handle.is_shutdown_requested() {
            // Failures are already logged and counted by tick().
            let _ = self.tick();
            self.handle.sleep_or_shutdown(self.interval).await;
        }

        self.phase = MonitorPhase::ShuttingDown;
        info!("Shutting down Energy Monitoring System...");
        self.rollup_logged();

        self.handle.state.running.store(false, Ordering::SeqCst);
        self.phase = MonitorPhase::Stopped;
        info!(
            "Monitor stopped after {} ticks ({} failed), {} rollups",
            self.handle.ticks(),
            self.handle.failed_ticks(),
            self.handle.rollups()
        );
    }

    /// Perform one tick without sleeping.
    ///
    /// Collects, processes, buffers, checks alerts, then rolls up if the
    /// rollup period has elapsed. A failed collection or analysis appends
    /// nothing; the period check still runs.
    pub fn tick(&mut self) -> Result<Vec<Alert>> {
        let result = self.sample();
        self.handle.state.ticks.fetch_add(1, Ordering::SeqCst);

        if let Err(ref e) = result {
            error!("Tick failed: {}", e);
            self.handle.state.failed_ticks.fetch_add(1, Ordering::SeqCst);
            self.observer.on_tick_error(e);
        }

        let now = self.clock.now();
        if now - self.window_start >= self.rollup_period {
            debug!("Rollup period elapsed since {}", self.window_start);
            self.rollup_logged();
            self.window_start = now;
        }

        result
    }

    fn sample(&mut self) -> Result<Vec<Alert>> {
        let snapshot = self.collector.collect_at(self.clock.now())?;
        info!("Collected data at {}", snapshot.timestamp);
        info!("{}", snapshot);

        let record = self.analyzer.process(&snapshot)?;
        self.observer.on_record(&record);
        let alerts = self.analyzer.check_alerts(&record);
        self.daily_data.push(record);

        if !alerts.is_empty() {
            for alert in &alerts {
                warn!("ALERT: {}", alert);
            }
            self.observer.on_alerts(&alerts);
        }

        Ok(alerts)
    }

    /// Take the buffer, summarize it and publish it.
    ///
    /// The buffer is cleared whether or not publishing succeeds.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::NoData`] if nothing is buffered
    /// - any error from the report sink
    pub fn rollup(&mut self) -> Result<RollupOutput> {
        let records = std::mem::take(&mut self.daily_data);
        let date = self.clock.now().date_naive();
        info!("Generating daily report for {} ({} records)...", date, records.len());

        let summary = self.analyzer.daily_summary(&records, date)?;
        let output = self.sink.publish(&records, &summary)?;

        self.handle.state.rollups.fetch_add(1, Ordering::SeqCst);
        self.observer.on_rollup(&summary, &output);
        info!(
            "Daily report generated successfully: {:.2} kWh, avg efficiency {:.3}, peak {:.2} kW, cost ${:.2}",
            summary.total_energy_consumed,
            summary.average_efficiency,
            summary.peak_power,
            summary.total_cost
        );
        Ok(output)
    }

    fn rollup_logged(&mut self) {
        match self.rollup() {
            Ok(_) => {}
            Err(MonitorError::NoData) => info!("No records buffered, skipping rollup"),
            Err(e) => error!("Rollup failed: {}", e),
        }
    }
}
