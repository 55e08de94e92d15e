// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Monitoring configuration.
//!
//! Every section has a `Default` matching the reference plant setup, and
//! every section may be omitted from a JSON file.

use crate::error::{MonitorError, Result};
use crate::registry::SensorRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Master configuration for the monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sensor registry and polling interval.
    pub sensors: SensorConfig,

    /// Alert thresholds.
    pub thresholds: AlertThresholds,

    /// Energy accounting constants.
    pub energy: EnergyConfig,

    /// Rollup output settings.
    pub report: ReportConfig,
}

/// Sensor polling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Seconds between collection ticks.
    pub collection_interval_secs: u64,

    /// Sensors to poll, grouped by kind.
    pub registry: SensorRegistry,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            collection_interval_secs: 300, // 5 minutes
            registry: SensorRegistry::default(),
        }
    }
}

impl SensorConfig {
    /// Collection interval as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.collection_interval_secs)
    }
}

/// Thresholds checked against every processed record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Total power above this fires an alert (kW).
    pub power_consumption_high: f64,
    /// Average temperature above this fires an alert (°C).
    pub temperature_high: f64,
    /// Efficiency below this fires an alert.
    pub efficiency_low: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            power_consumption_high: 1000.0,
            temperature_high: 80.0,
            efficiency_low: 0.85,
        }
    }
}

/// Energy accounting constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Price of one kWh.
    pub unit_cost_per_kwh: f64,
    /// Conversion factor from flow to useful work in the efficiency ratio.
    pub efficiency_factor: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            unit_cost_per_kwh: 0.12,
            efficiency_factor: 0.7,
        }
    }
}

/// How often buffered records are rolled up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCadence {
    /// Every hour.
    Hourly,
    /// Every day.
    Daily,
    /// Every week.
    Weekly,
}

impl ReportCadence {
    /// Wall-clock time between rollups.
    pub fn period(&self) -> chrono::Duration {
        match self {
            ReportCadence::Hourly => chrono::Duration::hours(1),
            ReportCadence::Daily => chrono::Duration::days(1),
            ReportCadence::Weekly => chrono::Duration::weeks(1),
        }
    }
}

/// Rollup output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rollup cadence.
    pub cadence: ReportCadence,
    /// Directory receiving CSV and PNG files (created on first use).
    pub reports_dir: PathBuf,
    /// Report recipients. Only logged; delivery is out of scope.
    pub recipients: Vec<String>,
    /// Number of past summaries shown in the summary bar chart.
    pub history_days: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cadence: ReportCadence::Daily,
            reports_dir: PathBuf::from("reports"),
            recipients: vec!["manager@company.com".to_string()],
            history_days: 30,
        }
    }
}

impl MonitorConfig {
    /// Parse a configuration from JSON text and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MonitorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check values the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.sensors.registry.validate()?;

        if self.sensors.collection_interval_secs == 0 {
            return Err(MonitorError::InvalidConfig(
                "collection_interval_secs must be at least 1".to_string(),
            ));
        }

        if self.energy.unit_cost_per_kwh < 0.0 || !self.energy.unit_cost_per_kwh.is_finite() {
            return Err(MonitorError::InvalidConfig(format!(
                "unit_cost_per_kwh must be a non-negative number, got {}",
                self.energy.unit_cost_per_kwh
            )));
        }
        if self.energy.efficiency_factor <= 0.0 || !self.energy.efficiency_factor.is_finite() {
            return Err(MonitorError::InvalidConfig(format!(
                "efficiency_factor must be positive, got {}",
                self.energy.efficiency_factor
            )));
        }
        if self.report.history_days == 0 {
            return Err(MonitorError::InvalidConfig(
                "history_days must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SensorKind;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.sensors.collection_interval_secs, 300);
        assert_eq!(config.sensors.interval(), Duration::from_secs(300));
        assert_eq!(config.thresholds.power_consumption_high, 1000.0);
        assert_eq!(config.thresholds.temperature_high, 80.0);
        assert_eq!(config.thresholds.efficiency_low, 0.85);
        assert_eq!(config.energy.unit_cost_per_kwh, 0.12);
        assert_eq!(config.report.cadence, ReportCadence::Daily);
        assert_eq!(config.report.reports_dir, PathBuf::from("reports"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MonitorConfig::from_json_str(
            r#"{"sensors": {"collection_interval_secs": 60}, "thresholds": {"temperature_high": 85.0}}"#,
        )
        .unwrap();
        assert_eq!(config.sensors.collection_interval_secs, 60);
        assert_eq!(config.sensors.registry.sensor_count(), 9);
        assert_eq!(config.thresholds.temperature_high, 85.0);
        assert_eq!(config.thresholds.power_consumption_high, 1000.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = MonitorConfig::default();
        let json = config.to_json().unwrap();
        let parsed = MonitorConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_registry_rejected() {
        let result = MonitorConfig::from_json_str(
            r#"{"sensors": {"registry": [{"kind": "power_meter", "sensors": ["PM001"]}]}}"#,
        );
        assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut config = MonitorConfig::default();
        config.energy.unit_cost_per_kwh = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = MonitorConfig::from_json_str(r#"{"sensors": {"collection_interval_secs": 0}}"#);
        assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_cadence_period() {
        assert_eq!(ReportCadence::Daily.period(), chrono::Duration::days(1));
        assert_eq!(ReportCadence::Hourly.period(), chrono::Duration::hours(1));
        let cadence: ReportCadence = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(cadence, ReportCadence::Weekly);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plant.json");
        std::fs::write(
            &path,
            r#"{"report": {"reports_dir": "/tmp/out", "history_days": 7}}"#,
        )
        .unwrap();

        let config = MonitorConfig::from_json_file(&path).unwrap();
        assert_eq!(config.report.history_days, 7);
        assert!(config.sensors.registry.sensors(SensorKind::FlowMeter).is_some());
    }
}
