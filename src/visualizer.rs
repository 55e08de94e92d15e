// Plantwatch - Plant energy monitoring
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! PNG charts of processed records and summaries.
//!
//! Time axes are plotted in hours since the first record and labelled with
//! wall-clock times. Every chart refuses an empty input with
//! [`MonitorError::EmptySeries`].

use crate::analyzer::{Metrics, ProcessedRecord};
use crate::error::{MonitorError, Result};
use crate::summary::DailySummary;
use chrono::{DateTime, Local};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Default canvas size in pixels.
pub const DEFAULT_SIZE: (u32, u32) = (1200, 600);

/// Renders charts into a reports directory.
#[derive(Debug, Clone)]
pub struct Visualizer {
    reports_dir: PathBuf,
    size: (u32, u32),
}

impl Visualizer {
    /// Create a visualizer writing into `reports_dir`.
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            size: DEFAULT_SIZE,
        }
    }

    /// Override the canvas size of single-panel charts. Multi-panel charts
    /// scale the height.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Output directory.
    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// `<reports_dir>/<name>.png`
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.reports_dir.join(format!("{}.png", name))
    }

    /// Line chart of total power over time.
    pub fn plot_power_consumption(&self, records: &[ProcessedRecord], name: &str) -> Result<PathBuf> {
        if records.is_empty() {
            return Err(MonitorError::EmptySeries("power consumption chart"));
        }

        let origin = records[0].timestamp;
        let points = time_series(records, |m| m.total_power_consumption);
        let path = self.output_path(name);
        {
            let root = BitMapBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;
            draw_line_panel(
                &root,
                "Power Consumption Over Time",
                "Power Consumption (kW)",
                "Total Power",
                &points,
                origin,
                BLUE,
            )?;
            root.present().map_err(chart_err)?;
        }
        Ok(path)
    }

    /// Efficiency over time on top, efficiency against temperature below.
    pub fn plot_efficiency_trends(&self, records: &[ProcessedRecord], name: &str) -> Result<PathBuf> {
        if records.is_empty() {
            return Err(MonitorError::EmptySeries("efficiency trends chart"));
        }

        let origin = records[0].timestamp;
        let trend = time_series(records, |m| m.efficiency);
        let correlation: Vec<(f64, f64)> = records
            .iter()
            .map(|r| (r.metrics.average_temperature, r.metrics.efficiency))
            .collect();

        let path = self.output_path(name);
        {
            let (width, height) = self.size;
            let root = BitMapBackend::new(&path, (width, height * 2)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;
            let panels = root.split_evenly((2, 1));

            draw_line_panel(
                &panels[0],
                "Energy Efficiency Over Time",
                "Efficiency",
                "Efficiency",
                &trend,
                origin,
                GREEN,
            )?;
            draw_scatter_panel(
                &panels[1],
                "Efficiency vs Temperature",
                "Temperature (°C)",
                "Efficiency",
                &correlation,
            )?;
            root.present().map_err(chart_err)?;
        }
        Ok(path)
    }

    /// Four bar panels, one bar per summary: energy, efficiency, peak
    /// power, cost.
    pub fn plot_daily_summaries(&self, summaries: &[DailySummary], name: &str) -> Result<PathBuf> {
        if summaries.is_empty() {
            return Err(MonitorError::EmptySeries("daily summary chart"));
        }

        let labels: Vec<String> = summaries
            .iter()
            .map(|s| s.date.format("%m-%d").to_string())
            .collect();
        let panels: [(&str, Vec<f64>, RGBColor); 4] = [
            (
                "Total Energy Consumed (kWh)",
                summaries.iter().map(|s| s.total_energy_consumed).collect(),
                BLUE,
            ),
            (
                "Average Efficiency",
                summaries.iter().map(|s| s.average_efficiency).collect(),
                GREEN,
            ),
            (
                "Peak Power (kW)",
                summaries.iter().map(|s| s.peak_power).collect(),
                RED,
            ),
            (
                "Total Cost ($)",
                summaries.iter().map(|s| s.total_cost).collect(),
                MAGENTA,
            ),
        ];

        let path = self.output_path(name);
        {
            let (width, height) = self.size;
            let root = BitMapBackend::new(&path, (width, height * 2)).into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;
            let areas = root.split_evenly((2, 2));

            for (area, (caption, values, color)) in areas.iter().zip(panels.iter()) {
                draw_bar_panel(area, caption, &labels, values, *color)?;
            }
            root.present().map_err(chart_err)?;
        }
        Ok(path)
    }
}

fn chart_err<E: Display>(e: E) -> MonitorError {
    MonitorError::Chart(e.to_string())
}

/// `(hours since first record, value)` pairs.
fn time_series<F>(records: &[ProcessedRecord], value: F) -> Vec<(f64, f64)>
where
    F: Fn(&Metrics) -> f64,
{
    let origin = records[0].timestamp;
    records
        .iter()
        .map(|r| {
            let hours = (r.timestamp - origin).num_milliseconds() as f64 / 3_600_000.0;
            (hours, value(&r.metrics))
        })
        .collect()
}

fn format_offset(origin: DateTime<Local>, hours: f64) -> String {
    let offset = chrono::Duration::milliseconds((hours * 3_600_000.0) as i64);
    (origin + offset).format("%m-%d %H:%M").to_string()
}

/// Range covering `values`, padded so a single point still gets an axis.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span <= f64::EPSILON {
        let pad = if min.abs() > 1.0 { min.abs() * 0.05 } else { 0.5 };
        return (min - pad)..(max + pad);
    }
    (min - span * 0.05)..(max + span * 0.05)
}

fn draw_line_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    y_desc: &str,
    label: &str,
    points: &[(f64, f64)],
    origin: DateTime<Local>,
    color: RGBColor,
) -> Result<()> {
    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));
    let x_fmt = |x: &f64| format_offset(origin, *x);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc(y_desc)
        .x_label_formatter(&x_fmt)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
        .map_err(chart_err)?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    Ok(())
}

fn draw_scatter_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, BLUE.mix(0.5).filled())),
        )
        .map_err(chart_err)?;

    Ok(())
}

fn draw_bar_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    labels: &[String],
    values: &[f64],
    color: RGBColor,
) -> Result<()> {
    let count = values.len() as u32;
    let top = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let y_max = if top > 0.0 { top * 1.1 } else { 1.0 };
    let x_fmt = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0u32..count).into_segmented(), 0.0..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&x_fmt)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(color.mix(0.8).filled())
                .margin(10)
                .data(values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
        )
        .map_err(chart_err)?;

    Ok(())
}
