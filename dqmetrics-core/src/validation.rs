//! JSON Schema validation for metrics output.
//!
//! Every metrics document is checked against an embedded JSON Schema before
//! it is written or published. Checks the schema cannot express (such as
//! `missing_rows <= total_rows`) run in code afterwards.
//!
//! # Security Guarantees
//! - Records may carry only the known metric fields, so no cell value or
//!   store credential can ride along in an extra field
//!
//! # Example
//! ```rust
//! use dqmetrics_core::validation::validate_metrics_output;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = json!([{
//!     "pipeline_name": "daily_dq",
//!     "run_timestamp": "2026-02-05 12:00:00",
//!     "metric_date": "2026-02-05",
//!     "table_name": "users",
//!     "column_name": "email",
//!     "total_rows": 10,
//!     "missing_rows": 2,
//!     "missing_percentage": 20.0
//! }]);
//!
//! validate_metrics_output(&metrics)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::quality::CompletenessMetric;

/// JSON Schema validation errors with record-level reporting
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with specific field errors
    #[error("Metrics validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// A record reports more missing rows than rows
    #[error(
        "Record {index} reports missing_rows {missing_rows} greater than total_rows {total_rows}"
    )]
    InconsistentCounts {
        index: usize,
        missing_rows: u64,
        total_rows: u64,
    },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

/// Embedded JSON Schema for the metrics document
const METRICS_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "Column completeness metrics",
  "type": "array",
  "items": {
    "type": "object",
    "additionalProperties": false,
    "required": [
      "pipeline_name",
      "run_timestamp",
      "metric_date",
      "table_name",
      "column_name",
      "total_rows",
      "missing_rows",
      "missing_percentage"
    ],
    "properties": {
      "pipeline_name": { "type": "string", "minLength": 1 },
      "run_timestamp": {
        "type": "string",
        "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$"
      },
      "metric_date": {
        "type": "string",
        "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}$"
      },
      "table_name": { "type": "string", "minLength": 1 },
      "column_name": { "type": "string", "minLength": 1 },
      "total_rows": { "type": "integer", "minimum": 0 },
      "missing_rows": { "type": "integer", "minimum": 0 },
      "missing_percentage": { "type": "number", "minimum": 0, "maximum": 100 }
    }
  }
}"#;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Initialize and compile the metrics JSON Schema.
///
/// Safe to call more than once; the first compiled schema is kept.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_metrics_validator() -> Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json = get_schema_definition()?;

    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    // Another thread may have won the race; either schema is the same
    let _ = COMPILED_SCHEMA.set(compiled);

    Ok(())
}

/// Validate a metrics document (a JSON array of records).
///
/// Compiles the schema on first use.
///
/// # Errors
/// Returns every schema violation found, or the first record whose counts
/// are inconsistent.
pub fn validate_metrics_output(json_value: &Value) -> Result<(), ValidationError> {
    initialize_metrics_validator()?;
    let schema = COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Metrics validator not initialized".to_string(),
        })?;

    let errors: Vec<String> = schema.iter_errors(json_value).map(|e| e.to_string()).collect();
    if !errors.is_empty() {
        return Err(ValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        });
    }

    validate_count_constraints(json_value)
}

/// Checks `missing_rows <= total_rows` on every record.
fn validate_count_constraints(json_value: &Value) -> Result<(), ValidationError> {
    let Some(records) = json_value.as_array() else {
        return Ok(());
    };

    for (index, record) in records.iter().enumerate() {
        let total_rows = record.get("total_rows").and_then(Value::as_u64);
        let missing_rows = record.get("missing_rows").and_then(Value::as_u64);

        if let (Some(total_rows), Some(missing_rows)) = (total_rows, missing_rows)
            && missing_rows > total_rows
        {
            return Err(ValidationError::InconsistentCounts {
                index,
                missing_rows,
                total_rows,
            });
        }
    }

    Ok(())
}

/// Validate and load metric records from a JSON string.
///
/// # Errors
/// Returns validation errors for malformed JSON or schema violations.
pub fn validate_and_parse_metrics(json_str: &str) -> Result<Vec<CompletenessMetric>, ValidationError> {
    let json_value: Value = serde_json::from_str(json_str)?;

    validate_metrics_output(&json_value)?;

    let metrics: Vec<CompletenessMetric> = serde_json::from_value(json_value)?;

    Ok(metrics)
}

/// Get the embedded JSON Schema as a parsed Value for external use
pub fn get_schema_definition() -> Result<Value, ValidationError> {
    serde_json::from_str(METRICS_SCHEMA).map_err(|e| ValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}
