// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Reading sources.
//!
//! The collector only talks to the [`ReadingSource`] trait. Two sources
//! ship with the crate:
//!
//! - [`SimulatedSource`]: uniform random readings by identifier prefix.
//! - [`ReplaySource`]: replays a recorded CSV, one row per snapshot.
//!   Stands in for hardware polling.

use crate::error::{MonitorError, ReadError, Result};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info};

/// Capability to read one scalar value per sensor identifier.
pub trait ReadingSource {
    /// Called once before the readings of a snapshot are taken.
    fn begin_snapshot(&mut self) {}

    /// Read the current value of a sensor.
    fn read(&mut self, sensor_id: &str) -> std::result::Result<f64, ReadError>;
}

impl<S: ReadingSource + ?Sized> ReadingSource for Box<S> {
    fn begin_snapshot(&mut self) {
        (**self).begin_snapshot()
    }

    fn read(&mut self, sensor_id: &str) -> std::result::Result<f64, ReadError> {
        (**self).read(sensor_id)
    }
}

/// Sensor class encoded in the identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorClass {
    /// `PM...`
    Power,
    /// `TMP...`
    Temperature,
    /// `FM...`
    Flow,
}

impl SensorClass {
    /// Classify an identifier by prefix.
    pub fn from_id(sensor_id: &str) -> Option<Self> {
        if sensor_id.starts_with("PM") {
            Some(SensorClass::Power)
        } else if sensor_id.starts_with("TMP") {
            Some(SensorClass::Temperature)
        } else if sensor_id.starts_with("FM") {
            Some(SensorClass::Flow)
        } else {
            None
        }
    }

    /// Simulated value range.
    pub fn range(&self) -> RangeInclusive<f64> {
        match self {
            SensorClass::Power => 800.0..=1200.0,
            SensorClass::Temperature => 60.0..=90.0,
            SensorClass::Flow => 100.0..=200.0,
        }
    }
}

/// Uniform random readings by identifier prefix.
///
/// Unrecognized prefixes read as `0.0`.
pub struct SimulatedSource {
    rng: StdRng,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSource {
    /// Entropy-seeded simulator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible simulator.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ReadingSource for SimulatedSource {
    fn read(&mut self, sensor_id: &str) -> std::result::Result<f64, ReadError> {
        Ok(match SensorClass::from_id(sensor_id) {
            Some(class) => self.rng.gen_range(class.range()),
            None => 0.0,
        })
    }
}

/// Replays a recorded CSV.
///
/// The first column is a timestamp (ignored), the remaining headers are
/// sensor identifiers. Each snapshot consumes one row. Empty cells read
/// as [`ReadError::Unavailable`].
#[derive(Debug)]
pub struct ReplaySource {
    rows: Vec<HashMap<String, f64>>,
    /// Index of the row being read; `None` before the first snapshot.
    cursor: Option<usize>,
    loop_replay: bool,
}

impl ReplaySource {
    /// Load a recording.
    pub fn from_csv(path: impl AsRef<Path>, loop_replay: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(MonitorError::InvalidConfig(format!(
                "{}: expected a timestamp column followed by sensor columns",
                path.display()
            )));
        }
        let sensor_ids: Vec<String> = headers.iter().skip(1).map(|s| s.trim().to_string()).collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row = HashMap::new();
            for (i, sensor_id) in sensor_ids.iter().enumerate() {
                let cell = record.get(i + 1).map(str::trim).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                let value = cell
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        MonitorError::InvalidConfig(format!(
                            "{}: invalid value {:?} for {}",
                            path.display(),
                            cell,
                            sensor_id
                        ))
                    })?;
                row.insert(sensor_id.clone(), value);
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(MonitorError::NoData);
        }

        info!(
            "Loaded recording {}: {} sensors, {} rows",
            path.display(),
            sensor_ids.len(),
            rows.len()
        );

        Ok(Self {
            rows,
            cursor: None,
            loop_replay,
        })
    }

    /// Number of recorded rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the recording has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ReadingSource for ReplaySource {
    fn begin_snapshot(&mut self) {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.cursor = if next < self.rows.len() {
            Some(next)
        } else if self.loop_replay {
            debug!("Recording complete, looping");
            Some(0)
        } else {
            Some(self.rows.len())
        };
    }

    fn read(&mut self, sensor_id: &str) -> std::result::Result<f64, ReadError> {
        let row = self
            .cursor
            .and_then(|c| self.rows.get(c))
            .ok_or(ReadError::Exhausted)?;
        row.get(sensor_id)
            .copied()
            .ok_or_else(|| ReadError::Unavailable(sensor_id.to_string()))
    }
}
