//! Completeness checker.
//!
//! Walks the configured tables in order, measures every required column and
//! reports whatever could not be measured. A failing table or column never
//! stops the rest of the batch.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RequiredColumns;
use crate::models::RunStamp;
use crate::source::TableSource;
use crate::table::NullCounts;

use super::completeness::build_metric_record;
use super::failure::{FailureReporter, QualityFailure};
use super::models::CompletenessMetric;

/// Produces completeness metrics for one pipeline.
///
/// # Example
///
/// ```rust
/// use dqmetrics_core::config::RequiredColumns;
/// use dqmetrics_core::quality::{CompletenessChecker, FailureLog};
/// use dqmetrics_core::source::MemorySource;
/// use dqmetrics_core::table::TableSnapshot;
///
/// let source = MemorySource::new().with_table(
///     "users",
///     TableSnapshot::new(
///         vec!["email".to_string()],
///         vec![vec![Some("a@example.com".to_string())], vec![None]],
///     ),
/// );
/// let required = RequiredColumns::new().with_table("users", ["email"]);
/// let mut failures = FailureLog::new();
///
/// let checker = CompletenessChecker::new("daily_dq");
/// let metrics = checker.run(&["users".to_string()], &required, &source, &mut failures);
///
/// assert_eq!(metrics.len(), 1);
/// assert_eq!(metrics[0].missing_percentage, 50.0);
/// assert!(failures.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct CompletenessChecker<C: Clock = SystemClock> {
    pipeline_name: String,
    clock: C,
}

impl CompletenessChecker<SystemClock> {
    /// Creates a checker stamped by the system clock.
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            clock: SystemClock,
        }
    }
}

impl<C: Clock> CompletenessChecker<C> {
    /// Replaces the clock used to stamp batches.
    pub fn with_clock<D: Clock>(self, clock: D) -> CompletenessChecker<D> {
        CompletenessChecker {
            pipeline_name: self.pipeline_name,
            clock,
        }
    }

    /// Name copied into every record.
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    /// Runs a batch, reporting `no_tables_defined` when there is nothing to check.
    pub fn run<S, R>(
        &self,
        tables: &[String],
        required: &RequiredColumns,
        source: &S,
        reporter: &mut R,
    ) -> Vec<CompletenessMetric>
    where
        S: TableSource + ?Sized,
        R: FailureReporter + ?Sized,
    {
        if tables.is_empty() {
            reporter.report(QualityFailure::NoTablesDefined);
            return Vec::new();
        }

        self.check_tables(tables, required, source, reporter)
    }

    /// Measures every required column of every table, in input order.
    ///
    /// The clock is read exactly once, so all records of the batch share
    /// `run_timestamp` and `metric_date`. An empty `tables` slice returns
    /// an empty result without reporting anything.
    pub fn check_tables<S, R>(
        &self,
        tables: &[String],
        required: &RequiredColumns,
        source: &S,
        reporter: &mut R,
    ) -> Vec<CompletenessMetric>
    where
        S: TableSource + ?Sized,
        R: FailureReporter + ?Sized,
    {
        let stamp = RunStamp::capture(&self.clock);
        let mut metrics = Vec::new();

        info!(
            "Running completeness checks for {} table(s) at {}",
            tables.len(),
            stamp.run_timestamp
        );

        for table in tables {
            let produced = self.check_table(table, required, source, reporter, &stamp, &mut metrics);
            debug!("Table '{}' produced {} metric(s)", table, produced);
        }

        info!("✓ Completeness checks produced {} metric(s)", metrics.len());
        metrics
    }

    fn check_table<S, R>(
        &self,
        table: &str,
        required: &RequiredColumns,
        source: &S,
        reporter: &mut R,
        stamp: &RunStamp,
        metrics: &mut Vec<CompletenessMetric>,
    ) -> usize
    where
        S: TableSource + ?Sized,
        R: FailureReporter + ?Sized,
    {
        let snapshot = match source.load_table(table) {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_not_found() => {
                reporter.report(QualityFailure::CsvNotFound {
                    table: table.to_string(),
                });
                return 0;
            }
            Err(e) => {
                reporter.report(QualityFailure::CsvReadError {
                    table: table.to_string(),
                    cause: e.to_string(),
                });
                return 0;
            }
        };

        if snapshot.is_empty() {
            reporter.report(QualityFailure::TableEmpty {
                table: table.to_string(),
            });
            return 0;
        }

        let Some(columns) = required.columns_for(table) else {
            reporter.report(QualityFailure::NoRequiredColumns {
                table: table.to_string(),
            });
            return 0;
        };

        let measured = MeasuredTable {
            name: table,
            schema: snapshot.columns(),
            total_rows: snapshot.row_count(),
            null_counts: snapshot.null_counts(),
        };

        self.score_columns(&measured, columns, stamp, reporter, metrics)
    }

    /// Emits one record per required column; a column that cannot be
    /// measured is reported and the remaining columns still run.
    fn score_columns<R>(
        &self,
        measured: &MeasuredTable<'_>,
        columns: &[String],
        stamp: &RunStamp,
        reporter: &mut R,
        metrics: &mut Vec<CompletenessMetric>,
    ) -> usize
    where
        R: FailureReporter + ?Sized,
    {
        let table = measured.name;
        let total_rows = measured.total_rows;
        let before = metrics.len();

        for column in columns {
            if !measured.schema.iter().any(|c| c == column) {
                reporter.report(QualityFailure::ColumnNotFound {
                    table: table.to_string(),
                    column: column.clone(),
                });
                continue;
            }

            match missing_rows(&measured.null_counts, column, total_rows) {
                Ok(missing) => {
                    let record = build_metric_record(
                        &self.pipeline_name,
                        stamp,
                        table,
                        column,
                        total_rows,
                        missing,
                    );
                    debug!(
                        "{}.{}: {}/{} missing ({}%)",
                        table, column, missing, total_rows, record.missing_percentage
                    );
                    metrics.push(record);
                }
                Err(cause) => {
                    warn!("Skipping column '{}' in table '{}'", column, table);
                    reporter.report(QualityFailure::ColumnProcessing {
                        table: table.to_string(),
                        column: column.clone(),
                        cause: cause.to_string(),
                    });
                }
            }
        }

        metrics.len() - before
    }
}

/// Counts taken from one loaded table.
struct MeasuredTable<'a> {
    name: &'a str,
    schema: &'a [String],
    total_rows: u64,
    null_counts: NullCounts,
}

/// Why a present column could not be measured.
#[derive(Debug, thiserror::Error)]
enum ColumnError {
    #[error("no null count was computed for the column")]
    MissingNullCount,

    #[error("missing count {missing} exceeds row count {total}")]
    CountExceedsRows { missing: u64, total: u64 },
}

fn missing_rows(counts: &NullCounts, column: &str, total: u64) -> Result<u64, ColumnError> {
    let missing = counts.get(column).ok_or(ColumnError::MissingNullCount)?;
    if missing > total {
        return Err(ColumnError::CountExceedsRows { missing, total });
    }
    Ok(missing)
}

/// Number of distinct tables that produced at least one record.
pub fn tables_processed(metrics: &[CompletenessMetric]) -> usize {
    metrics
        .iter()
        .map(|m| m.table_name.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Runs one batch with the system clock.
///
/// Free-function form of [`CompletenessChecker::check_tables`].
pub fn run_data_quality_checks<S, R>(
    tables: &[String],
    required: &RequiredColumns,
    source: &S,
    reporter: &mut R,
    pipeline_name: &str,
) -> Vec<CompletenessMetric>
where
    S: TableSource + ?Sized,
    R: FailureReporter + ?Sized,
{
    CompletenessChecker::new(pipeline_name).check_tables(tables, required, source, reporter)
}
