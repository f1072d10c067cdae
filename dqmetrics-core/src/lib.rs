//! Core data structures and utilities for dqmetrics.
//!
//! This crate measures column completeness for tabular datasets and
//! persists the results. It is shared by the `dqmetrics-collect` binary and
//! usable on its own.
//!
//! # Security Guarantees
//! - Metric records carry counts and ratios only, never cell values
//! - Store API keys are zeroized on drop and never logged or serialized
//! - Table identifiers are validated before any file is touched
//!
//! # Architecture
//! - `quality`: the completeness checker and its failure catalog
//! - `source`: table loading behind the `TableSource` trait
//! - `output` / `store`: file and remote persistence
//! - `config`: explicit configuration validated once at startup

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod quality;
pub mod security;
pub mod source;
pub mod store;
pub mod table;
pub mod validation;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PipelineConfig, RequiredColumns, TableList};
pub use error::{DqError, Result};
pub use logging::init_logging;
pub use models::{PipelineSummary, RunStamp};
pub use quality::{
    CompletenessChecker, CompletenessMetric, FailureKind, FailureLog, FailureReporter,
    QualityFailure, run_data_quality_checks,
};
pub use source::{CsvDirectorySource, TableSource};
pub use store::{MetricStore, RestTableStore};

pub use validation::{
    ValidationError, initialize_metrics_validator, validate_and_parse_metrics,
    validate_metrics_output,
};
