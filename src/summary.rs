// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Daily summaries and their CSV files.

use crate::error::{MonitorError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reduction of one rollup period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Rollup date.
    pub date: NaiveDate,
    /// Number of records reduced.
    pub samples: usize,
    /// Estimated energy (kWh).
    pub total_energy_consumed: f64,
    /// Mean efficiency.
    pub average_efficiency: f64,
    /// Highest total power seen (kW).
    pub peak_power: f64,
    /// Energy cost.
    pub total_cost: f64,
}

/// `YYYYMMDD` suffix used in report file names.
pub fn date_suffix(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `daily_summary_<suffix>.csv` under `dir`.
pub fn summary_csv_path(dir: &Path, suffix: &str) -> PathBuf {
    dir.join(format!("daily_summary_{}.csv", suffix))
}

/// File suffix for a rollup dated `date`.
///
/// The first rollup of a date gets `YYYYMMDD`. Later rollups on the same
/// date get `YYYYMMDD_2`, `YYYYMMDD_3`, ... so earlier reports are kept.
pub fn report_suffix(dir: &Path, date: NaiveDate) -> String {
    let base = date_suffix(date);
    if !summary_csv_path(dir, &base).exists() {
        return base;
    }
    let mut sequence = 2;
    loop {
        let candidate = format!("{}_{}", base, sequence);
        if !summary_csv_path(dir, &candidate).exists() {
            return candidate;
        }
        sequence += 1;
    }
}

/// Write a summary as a one-row CSV file with a header.
pub fn write_summary_csv(path: &Path, summary: &DailySummary) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.serialize(summary)?;
    writer.flush()?;
    Ok(())
}

/// Read the first summary row of a CSV file.
pub fn read_summary_csv(path: &Path) -> Result<DailySummary> {
    let mut reader = csv::Reader::from_path(path)?;
    match reader.deserialize::<DailySummary>().next() {
        Some(row) => Ok(row?),
        None => Err(MonitorError::NoData),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn summary() -> DailySummary {
        DailySummary {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            samples: 288,
            total_energy_consumed: 70_312.123456789,
            average_efficiency: 0.1048576,
            peak_power: 3512.75,
            total_cost: 8437.45481481468,
        }
    }

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(date_suffix(date), "20240201");
        assert_eq!(
            summary_csv_path(Path::new("reports"), &date_suffix(date)),
            PathBuf::from("reports/daily_summary_20240201.csv")
        );
    }

    #[test]
    fn test_report_suffix_sequences_same_date() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        assert_eq!(report_suffix(dir.path(), date), "20240201");
        write_summary_csv(&summary_csv_path(dir.path(), "20240201"), &summary()).unwrap();
        assert_eq!(report_suffix(dir.path(), date), "20240201_2");
        write_summary_csv(&summary_csv_path(dir.path(), "20240201_2"), &summary()).unwrap();
        assert_eq!(report_suffix(dir.path(), date), "20240201_3");

        let next_day = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
        assert_eq!(report_suffix(dir.path(), next_day), "20240202");
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let original = summary();
        let path = summary_csv_path(dir.path(), &date_suffix(original.date));

        write_summary_csv(&path, &original).unwrap();
        let restored = read_summary_csv(&path).unwrap();

        assert_eq!(restored.date, original.date);
        assert_eq!(restored.samples, original.samples);
        assert_relative_eq!(restored.total_energy_consumed, original.total_energy_consumed, epsilon = 1e-9);
        assert_relative_eq!(restored.average_efficiency, original.average_efficiency, epsilon = 1e-12);
        assert_relative_eq!(restored.peak_power, original.peak_power);
        assert_relative_eq!(restored.total_cost, original.total_cost, epsilon = 1e-9);
    }

    #[test]
    fn test_csv_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        write_summary_csv(&path, &summary()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "date,samples,total_energy_consumed,average_efficiency,peak_power,total_cost"
        );
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_read_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(
            &path,
            "date,samples,total_energy_consumed,average_efficiency,peak_power,total_cost\n",
        )
        .unwrap();
        assert!(matches!(read_summary_csv(&path), Err(MonitorError::NoData)));
    }
}
