//! Tests for the run-level models.

use super::*;
use crate::clock::FixedClock;
use chrono::NaiveDate;

fn instant(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 5)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

#[test]
fn test_run_stamp_formats() {
    let stamp = RunStamp::at(instant(9, 5, 7));

    assert_eq!(stamp.run_timestamp, "2026-02-05 09:05:07");
    assert_eq!(stamp.metric_date, "2026-02-05");
}

#[test]
fn test_run_stamp_capture_reads_clock_once() {
    let clock = FixedClock(instant(23, 59, 59));
    let stamp = RunStamp::capture(&clock);

    assert_eq!(stamp, RunStamp::at(instant(23, 59, 59)));
}

#[test]
fn test_summary_counts_failures() {
    let mut summary = PipelineSummary::new("daily_dq");
    summary.failures.insert(FailureKind::CsvNotFound, 2);
    summary.failures.insert(FailureKind::ColumnNotFound, 3);

    assert_eq!(summary.pipeline, "daily_dq");
    assert_eq!(summary.failure_count(), 5);
    assert!(!summary.json_saved);
    assert!(!summary.db_saved);
}

#[test]
fn test_summary_display() {
    let mut summary = PipelineSummary::new("daily_dq");
    summary.tables_processed = 2;
    summary.metrics_generated = 7;
    summary.json_saved = true;
    summary.failures.insert(FailureKind::TableEmpty, 1);

    let text = summary.to_string();
    assert!(text.contains("Pipeline: daily_dq"));
    assert!(text.contains("Tables processed: 2"));
    assert!(text.contains("Metrics generated: 7"));
    assert!(text.contains("JSON saved: true"));
    assert!(text.contains("DB saved: false"));
    assert!(text.contains("Failures (table_empty): 1"));
}

#[test]
fn test_summary_serializes_failure_kinds_as_keys() {
    let mut summary = PipelineSummary::new("daily_dq");
    summary.failures.insert(FailureKind::CsvReadError, 1);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["failures"]["csv_read_error"], 1);
}
