//! Completeness metric record.
//!
//! Records carry counts and ratios only, never cell values.

use serde::{Deserialize, Serialize};

/// Field names of [`CompletenessMetric`] in serialization order.
pub const METRIC_FIELDS: [&str; 8] = [
    "pipeline_name",
    "run_timestamp",
    "metric_date",
    "table_name",
    "column_name",
    "total_rows",
    "missing_rows",
    "missing_percentage",
];

/// Missing-value measurement for one column of one table.
///
/// One record is produced per (table, column) pair that passed validation
/// within a batch. All records of a batch share `run_timestamp` and
/// `metric_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessMetric {
    /// Pipeline that owns the run
    pub pipeline_name: String,
    /// Batch start time, `YYYY-MM-DD HH:MM:SS`
    pub run_timestamp: String,
    /// Batch start date, `YYYY-MM-DD`
    pub metric_date: String,
    /// Source table identifier
    pub table_name: String,
    /// Column within the table
    pub column_name: String,
    /// Row count of the table at load time
    pub total_rows: u64,
    /// Null or empty values in the column
    pub missing_rows: u64,
    /// `missing_rows / total_rows * 100`, rounded to 2 decimals; 0 for empty tables
    pub missing_percentage: f64,
}
