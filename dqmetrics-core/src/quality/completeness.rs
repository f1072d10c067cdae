//! Completeness arithmetic and record construction.
//!
//! Rounding is half-away-from-zero on the `f64` value at two decimals.

use crate::models::RunStamp;

use super::models::CompletenessMetric;

/// Rounds to two decimal places, half away from zero.
pub fn round_to_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of missing values, rounded to two decimals.
///
/// Returns exactly `0.0` when `total_rows` is zero, whatever `missing_rows`
/// says. The result is clamped to `[0, 100]`.
pub fn missing_percentage(missing_rows: u64, total_rows: u64) -> f64 {
    if total_rows == 0 {
        return 0.0;
    }

    if missing_rows > total_rows {
        tracing::warn!(
            "Completeness anomaly: missing_rows ({}) exceeds total_rows ({})",
            missing_rows,
            total_rows
        );
    }

    let percentage = missing_rows as f64 / total_rows as f64 * 100.0;
    round_to_two(percentage).clamp(0.0, 100.0)
}

/// Builds the metric record for one (table, column) pair.
pub fn build_metric_record(
    pipeline_name: &str,
    stamp: &RunStamp,
    table: &str,
    column: &str,
    total_rows: u64,
    missing_rows: u64,
) -> CompletenessMetric {
    CompletenessMetric {
        pipeline_name: pipeline_name.to_string(),
        run_timestamp: stamp.run_timestamp.clone(),
        metric_date: stamp.metric_date.clone(),
        table_name: table.to_string(),
        column_name: column.to_string(),
        total_rows,
        missing_rows,
        missing_percentage: missing_percentage(missing_rows, total_rows),
    }
}
