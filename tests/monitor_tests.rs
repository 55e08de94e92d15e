// Plantwatch - Monitor loop integration tests
//
// 1. Shutdown and final rollup
// 2. Rollup period
// 3. Failure handling

mod common;

use approx::assert_relative_eq;
use chrono::Duration as ChronoDuration;
use common::{start_time, ManualClock, RecordingSink, ScriptedSource};
use plantwatch::{
    FileReporter, Monitor, MonitorConfig, MonitorHandle, MonitorPhase, ReadingSource, ReportCadence,
};
use std::time::Duration;

fn scripted(handle: &MonitorHandle, clock: &ManualClock, step: ChronoDuration, stop_after: usize) -> ScriptedSource {
    ScriptedSource {
        power: 1000.0 / 3.0,
        temperature: 70.0,
        flow: 50.0,
        clock: clock.clone(),
        step,
        handle: handle.clone(),
        stop_after,
        snapshots: 0,
    }
}

fn build<S: ReadingSource>(
    source: S,
    sink: RecordingSink,
    clock: &ManualClock,
    handle: &MonitorHandle,
) -> Monitor<S, RecordingSink, ManualClock> {
    Monitor::new(&MonitorConfig::default(), source, sink)
        .unwrap()
        .with_clock(clock.clone())
        .with_handle(handle.clone())
        .with_interval(Duration::ZERO)
}

// ============================================================================
// Shutdown and final rollup
// ============================================================================

#[tokio::test]
async fn test_shutdown_performs_exactly_one_final_rollup() {
    let handle = MonitorHandle::new();
    let clock = ManualClock::starting_at(start_time());
    let source = scripted(&handle, &clock, ChronoDuration::minutes(5), 4);
    let mut monitor = build(source, RecordingSink::default(), &clock, &handle);

    monitor.run().await;

    assert_eq!(monitor.phase(), MonitorPhase::Stopped);
    assert_eq!(handle.ticks(), 4);
    assert_eq!(monitor.sink().calls.len(), 1);

    let (records, summary) = &monitor.sink().calls[0];
    assert_eq!(records.len(), 4);
    assert_eq!(summary.samples, 4);
    assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert!(monitor.buffered().is_empty());
    assert_eq!(handle.rollups(), 1);
}

#[tokio::test]
async fn test_final_rollup_uses_configured_interval() {
    let handle = MonitorHandle::new();
    let clock = ManualClock::starting_at(start_time());
    let source = scripted(&handle, &clock, ChronoDuration::minutes(5), 3);
    let mut monitor = build(source, RecordingSink::default(), &clock, &handle);

    monitor.run().await;

    // 3 records of 1000 kW at a 300 s interval
    let (_, summary) = &monitor.sink().calls[0];
    assert_relative_eq!(summary.peak_power, 1000.0, epsilon = 1e-9);
    assert_relative_eq!(summary.total_energy_consumed, 250.0, epsilon = 1e-9);
    assert_relative_eq!(summary.total_cost, 30.0, epsilon = 1e-9);
    assert_relative_eq!(summary.average_efficiency, 150.0 * 0.7 / 1000.0, epsilon = 1e-12);
}

// ============================================================================
// Rollup period
// ============================================================================

#[tokio::test]
async fn test_day_boundary_rolls_up_and_clears() {
    let handle = MonitorHandle::new();
    let clock = ManualClock::starting_at(start_time());
    let source = scripted(&handle, &clock, ChronoDuration::hours(8), 5);
    let mut monitor = build(source, RecordingSink::default(), &clock, &handle);

    monitor.run().await;

    let sizes: Vec<usize> = monitor.sink().calls.iter().map(|(r, _)| r.len()).collect();
    assert_eq!(sizes, vec![3, 2]);

    let first_batch_end = monitor.sink().calls[0].0.last().unwrap().timestamp;
    let second_batch_start = monitor.sink().calls[1].0[0].timestamp;
    assert!(first_batch_end < second_batch_start);
    assert_eq!(handle.rollups(), 2);
}

#[tokio::test]
async fn test_no_rollup_before_period() {
    let handle = MonitorHandle::new();
    let clock = ManualClock::starting_at(start_time());
    let source = scripted(&handle, &clock, ChronoDuration::hours(1), 23);
    let mut monitor = build(source, RecordingSink::default(), &clock, &handle);

    monitor.run().await;

    // 23 hours elapsed: only the shutdown rollup happens
    let sizes: Vec<usize> = monitor.sink().calls.iter().map(|(r, _)| r.len()).collect();
    assert_eq!(sizes, vec![23]);
}

#[tokio::test]
async fn test_hourly_rollups_keep_every_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = MonitorConfig::default();
    config.report.cadence = ReportCadence::Hourly;
    config.report.reports_dir = dir.path().to_path_buf();

    let handle = MonitorHandle::new();
    let clock = ManualClock::starting_at(start_time());
    let source = scripted(&handle, &clock, ChronoDuration::minutes(30), 6);
    let reporter = FileReporter::new(&config.report).without_charts();
    let mut monitor = Monitor::new(&config, source, reporter)
        .unwrap()
        .with_clock(clock.clone())
        .with_handle(handle.clone())
        .with_interval(Duration::ZERO);

    monitor.run().await;

    assert_eq!(handle.rollups(), 3);
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".csv"))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "daily_summary_20240201.csv",
            "daily_summary_20240201_2.csv",
            "daily_summary_20240201_3.csv",
        ]
    );
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_failed_rollup_does_not_stop_loop() {
    let handle = MonitorHandle::new();
    let clock = ManualClock::starting_at(start_time());
    let source = scripted(&handle, &clock, ChronoDuration::hours(8), 5);
    let sink = RecordingSink {
        fail_calls: vec![0],
        ..Default::default()
    };
    let mut monitor = build(source, sink, &clock, &handle);

    monitor.run().await;

    assert_eq!(handle.ticks(), 5);
    assert_eq!(monitor.sink().calls.len(), 2);
    // The failed batch is dropped, not retried with the final rollup
    assert_eq!(monitor.sink().calls[1].0.len(), 2);
    assert_eq!(handle.rollups(), 1);
}

#[tokio::test]
async fn test_zero_power_tick_is_skipped() {
    let handle = MonitorHandle::new();
    let clock = ManualClock::starting_at(start_time());
    let mut source = scripted(&handle, &clock, ChronoDuration::minutes(5), 3);
    source.power = 0.0;
    let mut monitor = build(source, RecordingSink::default(), &clock, &handle);

    monitor.run().await;

    assert_eq!(handle.ticks(), 3);
    assert_eq!(handle.failed_ticks(), 3);
    // Nothing buffered, so the final rollup is skipped
    assert!(monitor.sink().calls.is_empty());
    assert_eq!(monitor.phase(), MonitorPhase::Stopped);
}

#[tokio::test]
async fn test_alerts_do_not_affect_buffering() {
    let handle = MonitorHandle::new();
    let clock = ManualClock::starting_at(start_time());
    let mut source = scripted(&handle, &clock, ChronoDuration::minutes(5), 2);
    source.power = 400.0; // 1200 kW total
    source.temperature = 85.0;
    let mut monitor = build(source, RecordingSink::default(), &clock, &handle);

    let alerts = monitor.tick().unwrap();
    let kinds: Vec<_> = alerts.iter().map(|a| a.kind()).collect();
    assert_eq!(
        kinds,
        vec!["high_power_consumption", "high_temperature", "low_efficiency"]
    );
    assert_eq!(monitor.buffered().len(), 1);
}
