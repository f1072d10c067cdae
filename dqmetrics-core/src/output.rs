//! Metrics file output.
//!
//! Writes a batch as a JSON array indented with four spaces, validated
//! against the metrics schema first. Reads saved files back for publishing.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::Result;
use crate::error::DqError;
use crate::quality::CompletenessMetric;
use crate::validation::{validate_and_parse_metrics, validate_metrics_output};

/// Serializes metrics as a JSON array with four-space indentation.
///
/// # Errors
/// Returns `DqError::Serialization` if a record cannot be serialized.
pub fn render_metrics_json(metrics: &[CompletenessMetric]) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    metrics
        .serialize(&mut serializer)
        .map_err(|e| DqError::serialization("Failed to serialize metrics", e))?;

    String::from_utf8(buffer).map_err(|e| {
        DqError::configuration(format!("Serialized metrics are not valid UTF-8: {}", e))
    })
}

/// Validates and writes metrics to `output_path`, creating parent directories.
///
/// # Errors
/// Returns `DqError::Validation` if the document fails the schema and
/// `DqError::Io` if the directory or file cannot be written.
pub async fn save_metrics_json(metrics: &[CompletenessMetric], output_path: &Path) -> Result<()> {
    let json_data = render_metrics_json(metrics)?;

    let json_value: serde_json::Value = serde_json::from_str(&json_data)
        .map_err(|e| DqError::serialization("JSON parsing for validation", e))?;
    validate_metrics_output(&json_value)?;
    tracing::debug!("Output validation passed");

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DqError::io("create directory", parent, e))?;
    }

    tokio::fs::write(output_path, json_data)
        .await
        .map_err(|e| DqError::io("write to", output_path, e))?;

    tracing::info!(
        "✓ Saved {} metric(s) to {}",
        metrics.len(),
        output_path.display()
    );
    Ok(())
}

/// Reads and validates a previously saved metrics file.
///
/// # Errors
/// Returns `DqError::Io` if the file cannot be read and
/// `DqError::Validation` if its content is not a valid metrics document.
pub async fn load_metrics_json(path: &Path) -> Result<Vec<CompletenessMetric>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DqError::io("read", path, e))?;

    let metrics = validate_and_parse_metrics(&content)?;
    tracing::debug!("Loaded {} metric(s) from {}", metrics.len(), path.display());
    Ok(metrics)
}
