//! Column completeness assessment.
//!
//! This module measures, per required column of each configured table, how
//! many rows hold no value:
//! - **Checker**: batch orchestration with per-table and per-column recovery
//! - **Completeness**: percentage arithmetic and record construction
//! - **Failure**: fixed catalog of skip conditions and the reporter seam
//!
//! # Security Guarantees
//! - Metrics expose counts and ratios only, never cell values
//! - Failure messages name tables and columns, never row content
//!
//! # Example
//! ```rust
//! use dqmetrics_core::quality::missing_percentage;
//!
//! assert_eq!(missing_percentage(2, 10), 20.0);
//! assert_eq!(missing_percentage(0, 0), 0.0);
//! ```

mod checker;
mod completeness;
mod failure;
mod models;

// Re-export public API
pub use checker::{CompletenessChecker, run_data_quality_checks, tables_processed};
pub use completeness::{build_metric_record, missing_percentage, round_to_two};
pub use failure::{FailureKind, FailureLog, FailureReporter, FailureScope, QualityFailure};
pub use models::{CompletenessMetric, METRIC_FIELDS};
