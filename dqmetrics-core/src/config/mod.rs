//! Pipeline configuration.
//!
//! This module contains the explicit configuration a run is built from:
//! - `PipelineConfig`: everything a run needs, validated once at startup
//! - `OutputConfig`: where the metrics file goes
//! - `StoreConfig`: remote table store connection settings
//! - `TableList`, `RequiredColumns`, `FieldMapping`: input documents
//!
//! Nothing in here reads environment variables. The CLI resolves those and
//! hands over plain values.

mod inputs;
mod output;
mod pipeline;
mod store;

use std::path::Path;

use serde::de::DeserializeOwned;

pub use inputs::{FieldMapping, RequiredColumns, TableList};
pub use output::{DEFAULT_METRIC_NAME, OutputConfig};
pub use pipeline::{PipelineConfig, PipelineDocument};
pub use store::{DEFAULT_CONFLICT_COLUMNS, StoreConfig};

use crate::Result;
use crate::error::DqError;

/// Reads and parses a JSON document.
///
/// # Errors
/// Returns `DqError::Io` if the file cannot be read and
/// `DqError::Serialization` if it is not valid JSON for `T`.
pub fn load_json_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).map_err(|e| DqError::io("read", path, e))?;

    serde_json::from_str(&content)
        .map_err(|e| DqError::serialization(format!("Failed to parse {}", path.display()), e))
}
