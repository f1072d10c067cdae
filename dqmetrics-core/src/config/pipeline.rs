//! Top-level pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::output::OutputConfig;
use super::store::StoreConfig;
use crate::error::DqError;
use crate::source::CsvOptions;

/// Everything a pipeline run needs, validated once at startup.
///
/// # Example
/// ```rust
/// use dqmetrics_core::config::{OutputConfig, PipelineConfig};
///
/// let config = PipelineConfig::new("daily_dq", "data")
///     .with_output(OutputConfig::new("output").with_dated(false));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name copied into every metric record
    pub pipeline_name: String,
    /// Directory holding `<table>.csv` files
    pub data_dir: PathBuf,
    /// CSV parsing options
    #[serde(default)]
    pub csv: CsvOptions,
    /// Metrics file settings
    #[serde(default)]
    pub output: OutputConfig,
    /// Remote store settings; no upsert when absent
    #[serde(default)]
    pub store: Option<StoreConfig>,
}

impl PipelineConfig {
    /// Creates a config with default output and no store.
    pub fn new(pipeline_name: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            data_dir: data_dir.into(),
            csv: CsvOptions::default(),
            output: OutputConfig::default(),
            store: None,
        }
    }

    /// Builder method to set CSV options.
    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    /// Builder method to set output settings.
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Builder method to enable the remote store.
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = Some(store);
        self
    }

    /// Validates the whole configuration.
    ///
    /// # Errors
    /// Returns the first configuration problem found.
    pub fn validate(&self) -> crate::Result<()> {
        if self.pipeline_name.trim().is_empty() {
            return Err(DqError::configuration("pipeline name cannot be empty"));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(DqError::configuration("data directory cannot be empty"));
        }

        if matches!(self.csv.delimiter, b'"' | b'\n' | b'\r') {
            return Err(DqError::configuration(format!(
                "CSV delimiter {:?} is not usable",
                char::from(self.csv.delimiter)
            )));
        }

        if self.csv.extension.trim().is_empty() {
            return Err(DqError::configuration("CSV file extension cannot be empty"));
        }

        self.output.validate()?;

        if let Some(ref store) = self.store {
            store.validate()?;
        }

        Ok(())
    }
}

/// On-disk pipeline document.
///
/// Shape: `{"pipeline": {"name": "daily_dq"}, "paths": {"data": "data", "output": "output"}}`.
/// `paths.output` and `csv` are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDocument {
    /// Pipeline identity
    pub pipeline: PipelineSection,
    /// File system locations
    pub paths: PathsSection,
    /// CSV parsing options
    #[serde(default)]
    pub csv: Option<CsvOptions>,
}

/// `pipeline` section of the pipeline document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Pipeline name
    pub name: String,
}

/// `paths` section of the pipeline document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsSection {
    /// Directory holding table files
    pub data: PathBuf,
    /// Base directory for metrics files
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl PipelineDocument {
    /// Converts the document into a config with default output and no store.
    pub fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::new(self.pipeline.name, self.paths.data);
        if let Some(output_dir) = self.paths.output {
            config.output = OutputConfig::new(output_dir);
        }
        if let Some(csv) = self.csv {
            config.csv = csv;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::ApiKey;

    #[test]
    fn test_pipeline_config_validation() {
        assert!(PipelineConfig::new("daily", "data").validate().is_ok());
        assert!(PipelineConfig::new("  ", "data").validate().is_err());
        assert!(PipelineConfig::new("daily", "").validate().is_err());
        assert!(
            PipelineConfig::new("daily", "data")
                .with_csv(CsvOptions::new().with_delimiter(b'"'))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_pipeline_config_validates_store() {
        let bad_store = StoreConfig::new("https://x.supabase.co", ApiKey::new(""), "dq");
        let config = PipelineConfig::new("daily", "data").with_store(bad_store);

        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("API key"));
    }

    #[test]
    fn test_pipeline_config_validates_output() {
        let config = PipelineConfig::new("daily", "data")
            .with_output(OutputConfig::default().with_metric_name("a/b.json"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_document_conversion() {
        let document: PipelineDocument = serde_json::from_str(
            r#"{
                "pipeline": {"name": "daily_dq"},
                "paths": {"data": "data/raw", "output": "reports"},
                "csv": {"delimiter": 59}
            }"#,
        )
        .unwrap();

        let config = document.into_config();
        assert_eq!(config.pipeline_name, "daily_dq");
        assert_eq!(config.data_dir, PathBuf::from("data/raw"));
        assert_eq!(config.output.output_dir, PathBuf::from("reports"));
        assert_eq!(config.csv.delimiter, b';');
        assert!(config.store.is_none());
    }

    #[test]
    fn test_pipeline_document_minimal() {
        let document: PipelineDocument =
            serde_json::from_str(r#"{"pipeline": {"name": "p"}, "paths": {"data": "d"}}"#)
                .unwrap();

        let config = document.into_config();
        assert_eq!(config.output, OutputConfig::default());
        assert_eq!(config.csv, CsvOptions::default());
    }
}
