//! Run-level data models.
//!
//! A batch is stamped once when it starts ([`RunStamp`]) and summarised once
//! when it ends ([`PipelineSummary`]). Per-column records live in
//! [`crate::quality::CompletenessMetric`].

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::quality::FailureKind;

/// Format of `run_timestamp` values.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of `metric_date` values and dated output directories.
pub const METRIC_DATE_FORMAT: &str = "%Y-%m-%d";

/// The point in time a batch represents.
///
/// Captured once at batch start and copied into every record of that batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStamp {
    /// Wall-clock start time, `YYYY-MM-DD HH:MM:SS`
    pub run_timestamp: String,
    /// Calendar date of the start time, `YYYY-MM-DD`
    pub metric_date: String,
}

impl RunStamp {
    /// Reads the clock once and formats both fields from that single reading.
    pub fn capture<C: Clock + ?Sized>(clock: &C) -> Self {
        Self::at(clock.now())
    }

    /// Formats a stamp for the given instant.
    pub fn at(instant: NaiveDateTime) -> Self {
        Self {
            run_timestamp: instant.format(RUN_TIMESTAMP_FORMAT).to_string(),
            metric_date: instant.format(METRIC_DATE_FORMAT).to_string(),
        }
    }
}

/// End-of-run report for one pipeline invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Pipeline name copied into every record
    pub pipeline: String,
    /// Distinct tables that produced at least one metric
    pub tables_processed: usize,
    /// Number of metric records produced
    pub metrics_generated: usize,
    /// Whether the metrics file was written
    pub json_saved: bool,
    /// Whether the remote upsert was acknowledged
    pub db_saved: bool,
    /// Failures reported during the batch, by kind
    pub failures: BTreeMap<FailureKind, u64>,
}

impl PipelineSummary {
    /// Creates an empty summary for the named pipeline.
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            ..Self::default()
        }
    }

    /// Total number of failures across all kinds.
    pub fn failure_count(&self) -> u64 {
        self.failures.values().sum()
    }
}

impl std::fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pipeline: {}", self.pipeline)?;
        writeln!(f, "Tables processed: {}", self.tables_processed)?;
        writeln!(f, "Metrics generated: {}", self.metrics_generated)?;
        writeln!(f, "JSON saved: {}", self.json_saved)?;
        write!(f, "DB saved: {}", self.db_saved)?;
        for (kind, count) in &self.failures {
            write!(f, "\nFailures ({}): {}", kind, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
