// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Snapshot collection.
//!
//! The [`Collector`] walks the sensor registry in order and asks its
//! reading source for one value per sensor. Read failures propagate to the
//! caller unchanged; there are no retries.

use crate::error::Result;
use crate::monitor::MonitorHandle;
use crate::registry::SensorRegistry;
use crate::snapshot::{GroupReadings, Snapshot};
use crate::source::ReadingSource;
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{error, info};

/// Polls every registered sensor through a reading source.
pub struct Collector<S> {
    registry: SensorRegistry,
    source: S,
}

impl<S: ReadingSource> Collector<S> {
    /// Create a collector over a validated registry.
    pub fn new(registry: SensorRegistry, source: S) -> Self {
        Self { registry, source }
    }

    /// Sensor registry.
    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Underlying reading source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Collect a snapshot stamped with the current local time.
    pub fn collect(&mut self) -> Result<Snapshot> {
        self.collect_at(Local::now())
    }

    /// Collect a snapshot stamped with `timestamp`.
    ///
    /// All readings share the timestamp. Groups and readings keep
    /// registry order.
    pub fn collect_at(&mut self, timestamp: DateTime<Local>) -> Result<Snapshot> {
        self.source.begin_snapshot();

        let mut snapshot = Snapshot::new(timestamp);
        for group in self.registry.groups() {
            let mut readings = Vec::with_capacity(group.sensors.len());
            for sensor_id in &group.sensors {
                let value = self.source.read(sensor_id)?;
                readings.push((sensor_id.clone(), value));
            }
            snapshot.groups.push(GroupReadings {
                kind: group.kind,
                readings,
            });
        }

        Ok(snapshot)
    }

    /// Collect at a fixed interval until `handle` requests shutdown.
    ///
    /// Each snapshot is handed to `on_snapshot`. A failed read skips the
    /// tick. Returns the number of snapshots delivered.
    pub async fn run_continuous<F>(
        &mut self,
        interval: Duration,
        handle: &MonitorHandle,
        mut on_snapshot: F,
    ) -> usize
    where
        F: FnMut(&Snapshot),
    {
        info!(
            "Starting continuous collection: {} sensors every {:?}",
            self.registry.sensor_count(),
            interval
        );

        let mut delivered = 0;
        while !handle.is_shutdown_requested() {
            match self.collect() {
                Ok(snapshot) => {
                    info!("Collected data at {}", snapshot.timestamp);
                    info!("{}", snapshot);
                    on_snapshot(&snapshot);
                    delivered += 1;
                }
                Err(e) => error!("Collection failed: {}", e),
            }
            handle.sleep_or_shutdown(interval).await;
        }

        info!("Continuous collection stopped after {} snapshots", delivered);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MonitorError, ReadError};
    use crate::registry::{SensorGroup, SensorKind};
    use crate::source::SimulatedSource;

    /// Reads back a fixed value per identifier and counts snapshots.
    struct FixedSource {
        snapshots: usize,
        fail_on: Option<&'static str>,
    }

    impl ReadingSource for FixedSource {
        fn begin_snapshot(&mut self) {
            self.snapshots += 1;
        }

        fn read(&mut self, sensor_id: &str) -> std::result::Result<f64, ReadError> {
            if self.fail_on == Some(sensor_id) {
                return Err(ReadError::Source("bus timeout".to_string()));
            }
            Ok(sensor_id.len() as f64)
        }
    }

    #[test]
    fn test_collect_preserves_registry_order() {
        let registry = SensorRegistry::new(vec![
            SensorGroup::new(SensorKind::FlowMeter, ["FM2", "FM1"]),
            SensorGroup::new(SensorKind::PowerMeter, ["PM001"]),
            SensorGroup::new(SensorKind::Temperature, ["TMP001", "TMP0002"]),
        ]);
        let mut collector = Collector::new(
            registry,
            FixedSource {
                snapshots: 0,
                fail_on: None,
            },
        );

        let snapshot = collector.collect().unwrap();
        let kinds: Vec<_> = snapshot.groups.iter().map(|g| g.kind).collect();
        assert_eq!(
            kinds,
            vec![SensorKind::FlowMeter, SensorKind::PowerMeter, SensorKind::Temperature]
        );
        let flow_ids: Vec<_> = snapshot.groups[0].readings.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(flow_ids, vec!["FM2", "FM1"]);
        assert_eq!(snapshot.group(SensorKind::Temperature).unwrap().get("TMP0002"), Some(7.0));
        assert_eq!(collector.source_mut().snapshots, 1);
    }

    #[test]
    fn test_collect_single_timestamp() {
        let mut collector = Collector::new(SensorRegistry::default(), SimulatedSource::with_seed(3));
        let at = Local::now();
        let snapshot = collector.collect_at(at).unwrap();
        assert_eq!(snapshot.timestamp, at);
        assert_eq!(snapshot.reading_count(), 9);
    }

    #[test]
    fn test_read_failure_propagates() {
        let mut collector = Collector::new(
            SensorRegistry::default(),
            FixedSource {
                snapshots: 0,
                fail_on: Some("TMP002"),
            },
        );
        let result = collector.collect();
        assert!(matches!(
            result,
            Err(MonitorError::Read(ReadError::Source(_)))
        ));
    }

    #[tokio::test]
    async fn test_run_continuous_stops_on_shutdown() {
        let handle = MonitorHandle::new();
        let mut collector = Collector::new(SensorRegistry::default(), SimulatedSource::with_seed(9));

        let mut seen = Vec::new();
        let stopper = handle.clone();
        let delivered = collector
            .run_continuous(Duration::from_millis(1), &handle, |snapshot| {
                seen.push(snapshot.reading_count());
                if seen.len() == 3 {
                    stopper.shutdown();
                }
            })
            .await;

        assert_eq!(delivered, 3);
        assert_eq!(seen, vec![9, 9, 9]);
    }
}
