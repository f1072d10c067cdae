//! Failure catalog for completeness checks.
//!
//! Every skip condition in a batch is a [`QualityFailure`]. Failures are
//! handed to a [`FailureReporter`] and never returned as errors, so one bad
//! table or column cannot stop the rest of the batch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How much of the batch a failure skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureScope {
    /// The whole run produces nothing
    Batch,
    /// One table is skipped
    Table,
    /// One column is skipped
    Column,
}

/// Fixed catalog of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No tables configured for the run
    NoTablesDefined,
    /// Table file does not exist
    CsvNotFound,
    /// Table file exists but could not be loaded
    CsvReadError,
    /// Table loaded with no rows or no columns
    TableEmpty,
    /// No required columns configured for the table
    NoRequiredColumns,
    /// Required column missing from the table
    ColumnNotFound,
    /// Unexpected failure while measuring a column
    ColumnProcessingError,
}

impl FailureKind {
    /// All kinds, in catalog order.
    pub const ALL: [FailureKind; 7] = [
        FailureKind::NoTablesDefined,
        FailureKind::CsvNotFound,
        FailureKind::CsvReadError,
        FailureKind::TableEmpty,
        FailureKind::NoRequiredColumns,
        FailureKind::ColumnNotFound,
        FailureKind::ColumnProcessingError,
    ];

    /// Stable snake_case identifier used in logs and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NoTablesDefined => "no_tables_defined",
            FailureKind::CsvNotFound => "csv_not_found",
            FailureKind::CsvReadError => "csv_read_error",
            FailureKind::TableEmpty => "table_empty",
            FailureKind::NoRequiredColumns => "no_required_columns",
            FailureKind::ColumnNotFound => "column_not_found",
            FailureKind::ColumnProcessingError => "column_processing_error",
        }
    }

    /// Granularity at which this kind of failure is recovered.
    pub fn scope(&self) -> FailureScope {
        match self {
            FailureKind::NoTablesDefined => FailureScope::Batch,
            FailureKind::CsvNotFound
            | FailureKind::CsvReadError
            | FailureKind::TableEmpty
            | FailureKind::NoRequiredColumns => FailureScope::Table,
            FailureKind::ColumnNotFound | FailureKind::ColumnProcessingError => {
                FailureScope::Column
            }
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported failure with the arguments of its message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualityFailure {
    /// No tables were configured
    #[error("No tables defined for completeness checks")]
    NoTablesDefined,

    /// Table file does not exist
    #[error("CSV file not found for table '{table}'")]
    CsvNotFound { table: String },

    /// Table file could not be loaded
    #[error("Failed to read CSV for table '{table}': {cause}")]
    CsvReadError { table: String, cause: String },

    /// Table has no rows or no columns
    #[error("Table '{table}' is empty")]
    TableEmpty { table: String },

    /// No required columns configured for the table
    #[error("No required columns configured for table '{table}'")]
    NoRequiredColumns { table: String },

    /// Required column missing from the table
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Unexpected failure while measuring a column
    #[error("Failed to process column '{column}' in table '{table}': {cause}")]
    ColumnProcessing {
        table: String,
        column: String,
        cause: String,
    },
}

impl QualityFailure {
    /// Catalog kind of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            QualityFailure::NoTablesDefined => FailureKind::NoTablesDefined,
            QualityFailure::CsvNotFound { .. } => FailureKind::CsvNotFound,
            QualityFailure::CsvReadError { .. } => FailureKind::CsvReadError,
            QualityFailure::TableEmpty { .. } => FailureKind::TableEmpty,
            QualityFailure::NoRequiredColumns { .. } => FailureKind::NoRequiredColumns,
            QualityFailure::ColumnNotFound { .. } => FailureKind::ColumnNotFound,
            QualityFailure::ColumnProcessing { .. } => FailureKind::ColumnProcessingError,
        }
    }

    /// Table the failure concerns, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            QualityFailure::NoTablesDefined => None,
            QualityFailure::CsvNotFound { table }
            | QualityFailure::CsvReadError { table, .. }
            | QualityFailure::TableEmpty { table }
            | QualityFailure::NoRequiredColumns { table }
            | QualityFailure::ColumnNotFound { table, .. }
            | QualityFailure::ColumnProcessing { table, .. } => Some(table),
        }
    }

    /// Column the failure concerns, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            QualityFailure::ColumnNotFound { column, .. }
            | QualityFailure::ColumnProcessing { column, .. } => Some(column),
            _ => None,
        }
    }
}

/// Receives failures as a batch runs.
pub trait FailureReporter {
    /// Records one failure. Must not panic.
    fn report(&mut self, failure: QualityFailure);
}

impl<R: FailureReporter + ?Sized> FailureReporter for &mut R {
    fn report(&mut self, failure: QualityFailure) {
        (**self).report(failure);
    }
}

/// Logs every failure at ERROR level and keeps them for the run summary.
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    failures: Vec<QualityFailure>,
}

impl FailureLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures in the order they were reported.
    pub fn failures(&self) -> &[QualityFailure] {
        &self.failures
    }

    /// Number of failures of the given kind.
    pub fn count(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind() == kind).count()
    }

    /// Total failures reported.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Per-kind tally, omitting kinds that never occurred.
    pub fn counts_by_kind(&self) -> BTreeMap<FailureKind, u64> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind()).or_insert(0) += 1;
        }
        counts
    }
}

impl FailureReporter for FailureLog {
    fn report(&mut self, failure: QualityFailure) {
        tracing::error!(kind = %failure.kind(), "{}", failure);
        self.failures.push(failure);
    }
}
