// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Rollup output.
//!
//! A [`ReportSink`] receives the records and summary of each rollup. The
//! [`FileReporter`] writes them to a reports directory:
//!
//! ```text
//! reports/
//! ├── daily_summary_20240201.csv
//! ├── power_consumption_20240201.png
//! ├── efficiency_trends_20240201.png
//! ├── daily_summary_20240201.png
//! ├── daily_summary_20240201_2.csv     second rollup of the same date
//! └── ...
//! ```
//!
//! Chart files are only produced with the `charts` feature.

use crate::analyzer::ProcessedRecord;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::summary::{report_suffix, summary_csv_path, write_summary_csv, DailySummary};
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{debug, info};

#[cfg(feature = "charts")]
use crate::visualizer::Visualizer;

/// Files produced by one rollup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollupOutput {
    /// Summary CSV.
    pub summary_csv: Option<PathBuf>,
    /// Chart images.
    pub charts: Vec<PathBuf>,
}

/// Destination of rollups.
pub trait ReportSink {
    /// Publish one rollup. `records` are the buffered records the summary
    /// was computed from, in chronological order.
    fn publish(&mut self, records: &[ProcessedRecord], summary: &DailySummary) -> Result<RollupOutput>;
}

impl<R: ReportSink + ?Sized> ReportSink for Box<R> {
    fn publish(&mut self, records: &[ProcessedRecord], summary: &DailySummary) -> Result<RollupOutput> {
        (**self).publish(records, summary)
    }
}

/// Writes CSV summaries and charts into a directory.
pub struct FileReporter {
    reports_dir: PathBuf,
    recipients: Vec<String>,
    history: VecDeque<DailySummary>,
    history_days: usize,
    #[cfg(feature = "charts")]
    visualizer: Option<Visualizer>,
}

impl FileReporter {
    /// Create a reporter from report settings. Charts are enabled when the
    /// `charts` feature is compiled in.
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            reports_dir: config.reports_dir.clone(),
            recipients: config.recipients.clone(),
            history: VecDeque::with_capacity(config.history_days),
            history_days: config.history_days.max(1),
            #[cfg(feature = "charts")]
            visualizer: Some(Visualizer::new(config.reports_dir.clone())),
        }
    }

    /// Write CSV files only.
    #[allow(unused_mut)]
    pub fn without_charts(mut self) -> Self {
        #[cfg(feature = "charts")]
        {
            self.visualizer = None;
        }
        self
    }

    /// Output directory.
    pub fn reports_dir(&self) -> &std::path::Path {
        &self.reports_dir
    }

    /// Summaries retained for the summary chart, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &DailySummary> {
        self.history.iter()
    }

    /// Retained history plus `summary`, capped at `history_days`.
    #[cfg(feature = "charts")]
    fn history_with(&self, summary: &DailySummary) -> Vec<DailySummary> {
        let skip = (self.history.len() + 1).saturating_sub(self.history_days);
        self.history
            .iter()
            .skip(skip)
            .chain(std::iter::once(summary))
            .cloned()
            .collect()
    }

    fn remember(&mut self, summary: &DailySummary) {
        if self.history.len() == self.history_days {
            self.history.pop_front();
        }
        self.history.push_back(summary.clone());
    }
}

impl ReportSink for FileReporter {
    #[cfg_attr(not(feature = "charts"), allow(unused_variables, unused_mut))]
    fn publish(&mut self, records: &[ProcessedRecord], summary: &DailySummary) -> Result<RollupOutput> {
        if !self.reports_dir.exists() {
            debug!("Creating reports directory {}", self.reports_dir.display());
        }
        std::fs::create_dir_all(&self.reports_dir)?;

        let suffix = report_suffix(&self.reports_dir, summary.date);
        let mut output = RollupOutput::default();

        #[cfg(feature = "charts")]
        if let Some(ref visualizer) = self.visualizer {
            output.charts.push(
                visualizer.plot_power_consumption(records, &format!("power_consumption_{}", suffix))?,
            );
            output.charts.push(
                visualizer.plot_efficiency_trends(records, &format!("efficiency_trends_{}", suffix))?,
            );
            let history = self.history_with(summary);
            output.charts.push(
                visualizer.plot_daily_summaries(&history, &format!("daily_summary_{}", suffix))?,
            );
        }

        let csv_path = summary_csv_path(&self.reports_dir, &suffix);
        write_summary_csv(&csv_path, summary)?;
        output.summary_csv = Some(csv_path);

        // Only published summaries enter the history.
        self.remember(summary);

        if !self.recipients.is_empty() {
            info!(
                "Report for {} ready for {}",
                summary.date,
                self.recipients.join(", ")
            );
        }

        Ok(output)
    }
}
