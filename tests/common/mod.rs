//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Local, NaiveDate};
use plantwatch::{
    Clock, DailySummary, MonitorError, MonitorHandle, ProcessedRecord, ReadError, ReadingSource,
    ReportSink, RollupOutput, SensorClass,
};
use std::sync::{Arc, Mutex};

/// Clock whose time only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn starting_at(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

/// Fixed readings per sensor class. Advances a clock before each snapshot
/// and requests shutdown once `stop_after` snapshots were started.
pub struct ScriptedSource {
    pub power: f64,
    pub temperature: f64,
    pub flow: f64,
    pub clock: ManualClock,
    pub step: Duration,
    pub handle: MonitorHandle,
    pub stop_after: usize,
    pub snapshots: usize,
}

impl ReadingSource for ScriptedSource {
    fn begin_snapshot(&mut self) {
        self.clock.advance(self.step);
        self.snapshots += 1;
        if self.snapshots >= self.stop_after {
            self.handle.shutdown();
        }
    }

    fn read(&mut self, sensor_id: &str) -> Result<f64, ReadError> {
        match SensorClass::from_id(sensor_id) {
            Some(SensorClass::Power) => Ok(self.power),
            Some(SensorClass::Temperature) => Ok(self.temperature),
            Some(SensorClass::Flow) => Ok(self.flow),
            None => Err(ReadError::Unavailable(sensor_id.to_string())),
        }
    }
}

/// Sink remembering every publish call. Fails the calls listed in
/// `fail_calls` (0-based).
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Vec<(Vec<ProcessedRecord>, DailySummary)>,
    pub fail_calls: Vec<usize>,
}

impl ReportSink for RecordingSink {
    fn publish(
        &mut self,
        records: &[ProcessedRecord],
        summary: &DailySummary,
    ) -> plantwatch::Result<RollupOutput> {
        let call = self.calls.len();
        self.calls.push((records.to_vec(), summary.clone()));
        if self.fail_calls.contains(&call) {
            return Err(MonitorError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "reports directory is read-only",
            )));
        }
        Ok(RollupOutput::default())
    }
}

pub fn start_time() -> DateTime<Local> {
    NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_local_timezone(Local)
        .earliest()
        .unwrap()
}
