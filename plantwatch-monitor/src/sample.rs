// Plantwatch Monitor - Sample data
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fixed and synthetic inputs for the `analyze-sample` and
//! `render-sample` subcommands.

use chrono::{DateTime, Duration, Local};
use plantwatch::{Analyzer, DailySummary, Metrics, ProcessedRecord, SensorKind, Snapshot};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

/// The reference snapshot: three meters of each kind.
pub fn sample_snapshot(timestamp: DateTime<Local>) -> Snapshot {
    Snapshot::new(timestamp)
        .with_group(
            SensorKind::PowerMeter,
            [("PM001", 950.0), ("PM002", 1100.0), ("PM003", 880.0)],
        )
        .with_group(
            SensorKind::Temperature,
            [("TMP001", 75.0), ("TMP002", 78.0), ("TMP003", 72.0)],
        )
        .with_group(
            SensorKind::FlowMeter,
            [("FM001", 150.0), ("FM002", 160.0), ("FM003", 140.0)],
        )
}

/// Synthetic record generator.
///
/// Power, efficiency and temperature follow slow sine waves with
/// Gaussian noise on top. Flow is derived so that the records stay
/// consistent with the efficiency formula.
pub struct SyntheticDay {
    rng: StdRng,
    power_noise: Normal<f64>,
    efficiency_noise: Normal<f64>,
    efficiency_factor: f64,
    meters: f64,
}

impl SyntheticDay {
    pub fn new(seed: Option<u64>, efficiency_factor: f64) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            power_noise: Normal::new(0.0, 20.0).unwrap(),
            efficiency_noise: Normal::new(0.0, 0.01).unwrap(),
            efficiency_factor,
            meters: 3.0,
        }
    }

    /// `count` records spaced by `step`, starting at `start`.
    pub fn records(
        &mut self,
        start: DateTime<Local>,
        step: Duration,
        count: usize,
    ) -> Vec<ProcessedRecord> {
        (0..count)
            .map(|i| {
                let x = i as f64;
                let power = 900.0 + 100.0 * (x / 4.0).sin() + self.power_noise.sample(&mut self.rng);
                let efficiency =
                    0.85 + 0.05 * (x / 6.0).sin() + self.efficiency_noise.sample(&mut self.rng);
                let temperature = 75.0 + 5.0 * (x / 8.0).sin();

                ProcessedRecord {
                    timestamp: start + step * i as i32,
                    metrics: Metrics {
                        total_power_consumption: power,
                        average_power: power / self.meters,
                        average_temperature: temperature,
                        total_flow: efficiency * power / self.efficiency_factor,
                        efficiency,
                    },
                }
            })
            .collect()
    }

    /// One summary per day of `hours_per_day` hourly records.
    pub fn summaries(
        &mut self,
        analyzer: &Analyzer,
        start: DateTime<Local>,
        days: usize,
        hours_per_day: usize,
    ) -> plantwatch::Result<Vec<DailySummary>> {
        (0..days)
            .map(|day| {
                let day_start = start + Duration::days(day as i64);
                let records = self.records(day_start, Duration::hours(1), hours_per_day);
                analyzer.daily_summary(&records, day_start.date_naive())
            })
            .collect()
    }
}
