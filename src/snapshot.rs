//! Snapshot of one collection tick
//!
//! A snapshot holds every reading taken during one tick, grouped by sensor
//! kind in registry order, under a single timestamp.

use crate::registry::SensorKind;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Readings of one sensor group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReadings {
    /// Sensor kind.
    pub kind: SensorKind,
    /// `(sensor_id, value)` pairs in registry order.
    pub readings: Vec<(String, f64)>,
}

impl GroupReadings {
    /// Values only.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().map(|(_, v)| *v)
    }

    /// Value of one sensor.
    pub fn get(&self, sensor_id: &str) -> Option<f64> {
        self.readings
            .iter()
            .find(|(id, _)| id == sensor_id)
            .map(|(_, v)| *v)
    }
}

/// One timestamped batch of readings across all configured sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Time of collection, shared by every reading.
    pub timestamp: DateTime<Local>,
    /// Groups in registry order.
    pub groups: Vec<GroupReadings>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new(timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            groups: Vec::new(),
        }
    }

    /// Append a group (builder style).
    pub fn with_group<I, S>(mut self, kind: SensorKind, readings: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.groups.push(GroupReadings {
            kind,
            readings: readings.into_iter().map(|(id, v)| (id.into(), v)).collect(),
        });
        self
    }

    /// Readings of one kind.
    pub fn group(&self, kind: SensorKind) -> Option<&GroupReadings> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// Total number of readings.
    pub fn reading_count(&self) -> usize {
        self.groups.iter().map(|g| g.readings.len()).sum()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}:", group.kind)?;
            for (id, value) in &group.readings {
                write!(f, " {}={:.2}", id, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_lookup() {
        let snapshot = Snapshot::new(Local::now())
            .with_group(SensorKind::PowerMeter, [("PM001", 950.0), ("PM002", 1100.0)])
            .with_group(SensorKind::FlowMeter, [("FM001", 150.0)]);

        assert_eq!(snapshot.reading_count(), 3);
        let power = snapshot.group(SensorKind::PowerMeter).unwrap();
        assert_eq!(power.get("PM002"), Some(1100.0));
        assert_eq!(power.values().sum::<f64>(), 2050.0);
        assert!(snapshot.group(SensorKind::Temperature).is_none());
    }

    #[test]
    fn test_display() {
        let snapshot = Snapshot::new(Local::now())
            .with_group(SensorKind::PowerMeter, [("PM001", 950.0)])
            .with_group(SensorKind::Temperature, [("TMP001", 75.5)]);
        assert_eq!(
            snapshot.to_string(),
            "power_meter: PM001=950.00 | temperature: TMP001=75.50"
        );
    }
}
