// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sensor registry
//!
//! The registry maps each sensor kind to an ordered list of sensor
//! identifiers. It is loaded once from configuration and never changes
//! during a run. Group order and identifier order are preserved all the
//! way through collection.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Sensor category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Power meter (kW).
    PowerMeter,
    /// Temperature probe (°C).
    Temperature,
    /// Flow meter (m³/h).
    FlowMeter,
}

impl SensorKind {
    /// All kinds, in the order the analyzer reduces them.
    pub const ALL: [SensorKind; 3] = [
        SensorKind::PowerMeter,
        SensorKind::Temperature,
        SensorKind::FlowMeter,
    ];

    /// Configuration name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::PowerMeter => "power_meter",
            SensorKind::Temperature => "temperature",
            SensorKind::FlowMeter => "flow_meter",
        }
    }

    /// Unit of the readings.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::PowerMeter => "kW",
            SensorKind::Temperature => "°C",
            SensorKind::FlowMeter => "m³/h",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One kind of sensor and its identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorGroup {
    /// Sensor kind.
    pub kind: SensorKind,
    /// Identifiers, in polling order.
    pub sensors: Vec<String>,
}

impl SensorGroup {
    /// Create a group from identifiers.
    pub fn new<I, S>(kind: SensorKind, sensors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            sensors: sensors.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered mapping from sensor kind to sensor identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorRegistry {
    groups: Vec<SensorGroup>,
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new(vec![
            SensorGroup::new(SensorKind::PowerMeter, ["PM001", "PM002", "PM003"]),
            SensorGroup::new(SensorKind::Temperature, ["TMP001", "TMP002", "TMP003"]),
            SensorGroup::new(SensorKind::FlowMeter, ["FM001", "FM002", "FM003"]),
        ])
    }
}

impl SensorRegistry {
    /// Create a registry from groups. Call [`validate`](Self::validate)
    /// before handing it to a collector.
    pub fn new(groups: Vec<SensorGroup>) -> Self {
        Self { groups }
    }

    /// Groups in registry order.
    pub fn groups(&self) -> &[SensorGroup] {
        &self.groups
    }

    /// Identifiers of one kind.
    pub fn sensors(&self, kind: SensorKind) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|g| g.kind == kind)
            .map(|g| g.sensors.as_slice())
    }

    /// Total number of sensors.
    pub fn sensor_count(&self) -> usize {
        self.groups.iter().map(|g| g.sensors.len()).sum()
    }

    /// Check that every kind appears exactly once with at least one
    /// sensor, and that identifiers are non-empty and unique.
    pub fn validate(&self) -> Result<()> {
        for kind in SensorKind::ALL {
            match self.groups.iter().filter(|g| g.kind == kind).count() {
                0 => {
                    return Err(MonitorError::InvalidConfig(format!(
                        "sensor group {} is missing",
                        kind
                    )))
                }
                1 => {}
                n => {
                    return Err(MonitorError::InvalidConfig(format!(
                        "sensor group {} appears {} times",
                        kind, n
                    )))
                }
            }
        }

        let mut seen = HashSet::new();
        for group in &self.groups {
            if group.sensors.is_empty() {
                return Err(MonitorError::InvalidConfig(format!(
                    "sensor group {} has no sensors",
                    group.kind
                )));
            }
            for id in &group.sensors {
                if id.trim().is_empty() {
                    return Err(MonitorError::InvalidConfig(format!(
                        "sensor group {} contains an empty identifier",
                        group.kind
                    )));
                }
                if !seen.insert(id.as_str()) {
                    return Err(MonitorError::InvalidConfig(format!(
                        "duplicate sensor identifier: {}",
                        id
                    )));
                }
            }
        }

        Ok(())
    }
}
