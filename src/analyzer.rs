// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Snapshot analysis.
//!
//! The [`Analyzer`] turns a [`Snapshot`] into a [`ProcessedRecord`],
//! evaluates alert thresholds, and reduces a buffer of records into a
//! [`DailySummary`].
//!
//! ## Metrics
//!
//! | Metric | Definition |
//! |--------|------------|
//! | `total_power_consumption` | Σ power readings (kW) |
//! | `average_power` | total power / power sensor count |
//! | `average_temperature` | Σ temperature / temperature sensor count |
//! | `total_flow` | Σ flow readings (m³/h) |
//! | `efficiency` | `total_flow × factor / total_power` (0 when flow is 0) |
//!
//! ## Energy accounting
//!
//! Each record stands for one collection interval, so the energy of a
//! buffer is `Σ total_power × interval_hours`.

use crate::config::{AlertThresholds, EnergyConfig};
use crate::error::{DataQualityError, MonitorError, Result};
use crate::registry::SensorKind;
use crate::snapshot::Snapshot;
use crate::summary::DailySummary;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Metrics derived from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Σ power readings (kW).
    pub total_power_consumption: f64,
    /// Mean power per meter (kW).
    pub average_power: f64,
    /// Mean temperature (°C).
    pub average_temperature: f64,
    /// Σ flow readings (m³/h).
    pub total_flow: f64,
    /// Dimensionless efficiency ratio.
    pub efficiency: f64,
}

/// Result of processing one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    /// Snapshot timestamp.
    pub timestamp: DateTime<Local>,
    /// Derived metrics.
    pub metrics: Metrics,
}

/// A threshold violation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// Total power above the configured ceiling.
    HighPowerConsumption { value: f64, threshold: f64 },
    /// Average temperature above the configured ceiling.
    HighTemperature { value: f64, threshold: f64 },
    /// Efficiency below the configured floor.
    LowEfficiency { value: f64, threshold: f64 },
}

impl Alert {
    /// Stable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Alert::HighPowerConsumption { .. } => "high_power_consumption",
            Alert::HighTemperature { .. } => "high_temperature",
            Alert::LowEfficiency { .. } => "low_efficiency",
        }
    }

    /// Observed value.
    pub fn value(&self) -> f64 {
        match *self {
            Alert::HighPowerConsumption { value, .. }
            | Alert::HighTemperature { value, .. }
            | Alert::LowEfficiency { value, .. } => value,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::HighPowerConsumption { value, .. } => {
                write!(f, "High power consumption alert: {:.2} kW", value)
            }
            Alert::HighTemperature { value, .. } => {
                write!(f, "High temperature alert: {:.2} °C", value)
            }
            Alert::LowEfficiency { value, .. } => {
                write!(f, "Low efficiency alert: {:.2}%", value * 100.0)
            }
        }
    }
}

/// Reduces snapshots and record buffers.
#[derive(Debug, Clone)]
pub struct Analyzer {
    thresholds: AlertThresholds,
    energy: EnergyConfig,
    collection_interval: Duration,
}

impl Analyzer {
    /// Create an analyzer.
    ///
    /// `collection_interval` is the time each record stands for in the
    /// energy estimate.
    pub fn new(
        thresholds: AlertThresholds,
        energy: EnergyConfig,
        collection_interval: Duration,
    ) -> Self {
        Self {
            thresholds,
            energy,
            collection_interval,
        }
    }

    /// Alert thresholds.
    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Reduce a snapshot to metrics.
    ///
    /// # Errors
    ///
    /// - [`DataQualityError::MissingGroup`] if a sensor kind is absent
    /// - [`DataQualityError::EmptyGroup`] if a sensor kind has no readings
    /// - [`DataQualityError::ZeroPower`] if flow is nonzero and power is zero
    pub fn process(&self, snapshot: &Snapshot) -> Result<ProcessedRecord> {
        let (total_power, power_count) = group_sum(snapshot, SensorKind::PowerMeter)?;
        let (total_temperature, temperature_count) = group_sum(snapshot, SensorKind::Temperature)?;
        let (total_flow, _) = group_sum(snapshot, SensorKind::FlowMeter)?;

        let efficiency = self.calculate_efficiency(total_power, total_flow)?;

        Ok(ProcessedRecord {
            timestamp: snapshot.timestamp,
            metrics: Metrics {
                total_power_consumption: total_power,
                average_power: total_power / power_count as f64,
                average_temperature: total_temperature / temperature_count as f64,
                total_flow,
                efficiency,
            },
        })
    }

    /// Efficiency ratio of flow against power draw.
    ///
    /// Zero flow yields `0.0` whatever the power.
    pub fn calculate_efficiency(&self, power: f64, flow: f64) -> Result<f64> {
        if flow == 0.0 {
            return Ok(0.0);
        }
        if power == 0.0 {
            return Err(DataQualityError::ZeroPower { flow }.into());
        }
        Ok(flow * self.energy.efficiency_factor / power)
    }

    /// Threshold checks, in fixed order: power, temperature, efficiency.
    pub fn check_alerts(&self, record: &ProcessedRecord) -> Vec<Alert> {
        let metrics = &record.metrics;
        let thresholds = &self.thresholds;
        let mut alerts = Vec::new();

        if metrics.total_power_consumption > thresholds.power_consumption_high {
            alerts.push(Alert::HighPowerConsumption {
                value: metrics.total_power_consumption,
                threshold: thresholds.power_consumption_high,
            });
        }

        if metrics.average_temperature > thresholds.temperature_high {
            alerts.push(Alert::HighTemperature {
                value: metrics.average_temperature,
                threshold: thresholds.temperature_high,
            });
        }

        if metrics.efficiency < thresholds.efficiency_low {
            alerts.push(Alert::LowEfficiency {
                value: metrics.efficiency,
                threshold: thresholds.efficiency_low,
            });
        }

        alerts
    }

    /// Reduce a record buffer into a summary dated `date`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NoData`] if `records` is empty.
    pub fn daily_summary(&self, records: &[ProcessedRecord], date: NaiveDate) -> Result<DailySummary> {
        if records.is_empty() {
            return Err(MonitorError::NoData);
        }

        let interval_hours = self.collection_interval.as_secs_f64() / 3600.0;
        let power_sum: f64 = records
            .iter()
            .map(|r| r.metrics.total_power_consumption)
            .sum();
        let peak_power = records
            .iter()
            .map(|r| r.metrics.total_power_consumption)
            .fold(f64::NEG_INFINITY, f64::max);
        let average_efficiency =
            records.iter().map(|r| r.metrics.efficiency).sum::<f64>() / records.len() as f64;

        let total_energy_consumed = power_sum * interval_hours;

        Ok(DailySummary {
            date,
            samples: records.len(),
            total_energy_consumed,
            average_efficiency,
            peak_power,
            total_cost: total_energy_consumed * self.energy.unit_cost_per_kwh,
        })
    }
}

/// Sum and count of one group's readings.
fn group_sum(snapshot: &Snapshot, kind: SensorKind) -> Result<(f64, usize)> {
    let group = snapshot
        .group(kind)
        .ok_or(DataQualityError::MissingGroup(kind))?;
    if group.readings.is_empty() {
        return Err(DataQualityError::EmptyGroup(kind).into());
    }
    Ok((group.values().sum(), group.readings.len()))
}
