//! Metrics file output configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name used when no metric name is configured.
pub const DEFAULT_METRIC_NAME: &str = "completeness_metrics.json";

/// Where and whether the metrics file is written.
///
/// # Example
/// ```rust
/// use dqmetrics_core::config::OutputConfig;
/// use std::path::Path;
///
/// let output = OutputConfig::new("output").with_metric_name("completeness.json");
/// assert_eq!(
///     output.resolve_path("2026-02-05"),
///     Path::new("output").join("2026-02-05").join("completeness.json")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Whether to write the metrics file at all
    pub enabled: bool,
    /// Base directory for metrics files
    pub output_dir: PathBuf,
    /// File name of the metrics file
    pub metric_name: String,
    /// Whether to nest the file under a `YYYY-MM-DD` directory
    pub dated: bool,
    /// Exact path to write, overriding the derived one
    pub path_override: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: PathBuf::from("output"),
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            dated: true,
            path_override: None,
        }
    }
}

impl OutputConfig {
    /// Creates an output config rooted at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Builder method to enable/disable the metrics file.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder method to set the file name.
    pub fn with_metric_name(mut self, metric_name: impl Into<String>) -> Self {
        self.metric_name = metric_name.into();
        self
    }

    /// Builder method to enable/disable the dated directory.
    pub fn with_dated(mut self, dated: bool) -> Self {
        self.dated = dated;
        self
    }

    /// Builder method to write to an exact path.
    pub fn with_path_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.path_override = Some(path.into());
        self
    }

    /// Path the metrics file for a batch dated `metric_date` is written to.
    pub fn resolve_path(&self, metric_date: &str) -> PathBuf {
        if let Some(ref path) = self.path_override {
            return path.clone();
        }

        let base: &Path = &self.output_dir;
        if self.dated {
            base.join(metric_date).join(&self.metric_name)
        } else {
            base.join(&self.metric_name)
        }
    }

    /// Validates the output settings.
    ///
    /// # Errors
    /// Returns error if the file name is empty or contains a path separator.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.enabled || self.path_override.is_some() {
            return Ok(());
        }

        if self.metric_name.trim().is_empty() {
            return Err(crate::error::DqError::configuration(
                "metric name cannot be empty",
            ));
        }

        if self.metric_name.contains(['/', '\\']) || self.metric_name == ".." {
            return Err(crate::error::DqError::configuration(format!(
                "metric name '{}' must be a file name, not a path",
                self.metric_name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_config_default() {
        let output = OutputConfig::default();
        assert!(output.enabled);
        assert!(output.dated);
        assert_eq!(output.metric_name, DEFAULT_METRIC_NAME);
        assert!(output.validate().is_ok());
    }

    #[test]
    fn test_resolve_path_undated() {
        let output = OutputConfig::new("/var/dq")
            .with_metric_name("m.json")
            .with_dated(false);

        assert_eq!(output.resolve_path("2026-02-05"), Path::new("/var/dq/m.json"));
    }

    #[test]
    fn test_resolve_path_override_wins() {
        let output = OutputConfig::new("/var/dq").with_path_override("/tmp/custom.json");

        assert_eq!(
            output.resolve_path("2026-02-05"),
            Path::new("/tmp/custom.json")
        );
    }

    #[test]
    fn test_output_config_validation() {
        assert!(OutputConfig::default().with_metric_name("").validate().is_err());
        assert!(
            OutputConfig::default()
                .with_metric_name("../m.json")
                .validate()
                .is_err()
        );
        // Disabled output is never checked
        assert!(
            OutputConfig::default()
                .with_enabled(false)
                .with_metric_name("")
                .validate()
                .is_ok()
        );
    }
}
