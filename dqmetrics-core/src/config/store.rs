//! Remote table store configuration.
//!
//! # Security
//! The API key lives in an [`ApiKey`] and is skipped on serialization.
//! `Display` shows the redacted URL and table only.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::FieldMapping;
use crate::error::{DqError, redact_url};
use crate::quality::METRIC_FIELDS;
use crate::security::ApiKey;

/// Natural key of a metric record, used to resolve upsert conflicts.
///
/// Conflict columns are metric field names; a field mapping renames them
/// to store columns when the endpoint is built.
pub const DEFAULT_CONFLICT_COLUMNS: [&str; 4] =
    ["pipeline_name", "metric_date", "table_name", "column_name"];

/// Connection settings for the remote table store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`
    pub url: String,
    /// API key sent as `apikey` and bearer token
    #[serde(skip_serializing)]
    pub api_key: ApiKey,
    /// Destination table
    pub table_name: String,
    /// Metric fields forming the upsert conflict target
    #[serde(default = "default_conflict_columns")]
    pub on_conflict: Vec<String>,
    /// Request timeout
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

fn default_conflict_columns() -> Vec<String> {
    DEFAULT_CONFLICT_COLUMNS
        .iter()
        .map(|c| (*c).to_string())
        .collect()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl std::fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoreConfig({} -> {})", redact_url(&self.url), self.table_name)
    }
}

impl StoreConfig {
    /// Creates a store config with the default conflict key and timeout.
    pub fn new(url: impl Into<String>, api_key: ApiKey, table_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            table_name: table_name.into(),
            on_conflict: default_conflict_columns(),
            timeout: default_timeout(),
        }
    }

    /// Builder method to set the conflict target as metric field names.
    pub fn with_on_conflict<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on_conflict = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates store settings.
    ///
    /// # Errors
    /// Returns error if the URL is not http(s), the key or table is blank,
    /// the conflict target is empty or names something other than a metric
    /// field, or the timeout is zero.
    pub fn validate(&self) -> crate::Result<()> {
        let parsed = url::Url::parse(&self.url).map_err(|e| {
            DqError::configuration(format!(
                "store URL '{}' is invalid: {}",
                redact_url(&self.url),
                e
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DqError::configuration(format!(
                "store URL scheme '{}' is not supported, use http or https",
                parsed.scheme()
            )));
        }

        if self.api_key.is_blank() {
            return Err(DqError::configuration("store API key cannot be empty"));
        }

        if self.table_name.trim().is_empty() {
            return Err(DqError::configuration("store table name cannot be empty"));
        }

        if self.on_conflict.is_empty() {
            return Err(DqError::configuration(
                "store conflict target needs at least one metric field",
            ));
        }

        if let Some(field) = self
            .on_conflict
            .iter()
            .find(|c| !METRIC_FIELDS.contains(&c.as_str()))
        {
            return Err(DqError::configuration(format!(
                "store conflict column '{}' is not a metric field",
                field
            )));
        }

        if self.timeout.is_zero() {
            return Err(DqError::configuration(
                "store timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Store columns for the conflict target, renamed through `mapping`.
    ///
    /// # Errors
    /// Returns a configuration error if a conflict field is not mapped,
    /// since the store would not receive that column.
    pub fn conflict_columns(&self, mapping: Option<&FieldMapping>) -> crate::Result<Vec<String>> {
        let Some(mapping) = mapping else {
            return Ok(self.on_conflict.clone());
        };

        self.on_conflict
            .iter()
            .map(|field| {
                mapping.column_for(field).map(str::to_string).ok_or_else(|| {
                    DqError::configuration(format!(
                        "store conflict field '{}' is not in the field mapping; \
                         map it or choose other conflict fields",
                        field
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StoreConfig {
        StoreConfig::new(
            "https://project.supabase.co",
            ApiKey::new("service-key"),
            "dq_metrics",
        )
    }

    #[test]
    fn test_store_config_defaults() {
        let store = config();

        assert_eq!(
            store.on_conflict,
            vec!["pipeline_name", "metric_date", "table_name", "column_name"]
        );
        assert_eq!(store.timeout, Duration::from_secs(30));
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_store_config_validation() {
        let mut store = config();
        store.url = "ftp://project.supabase.co".to_string();
        assert!(store.validate().is_err());

        let mut store = config();
        store.url = "not a url".to_string();
        assert!(store.validate().is_err());

        let store = StoreConfig::new("https://x.supabase.co", ApiKey::new(" "), "dq_metrics");
        assert!(store.validate().is_err());

        let store = StoreConfig::new("https://x.supabase.co", ApiKey::new("k"), "");
        assert!(store.validate().is_err());

        let store = config().with_timeout(Duration::ZERO);
        assert!(store.validate().is_err());

        let store = config().with_on_conflict(["metric_date", ""]);
        assert!(store.validate().is_err());

        let store = config().with_on_conflict(Vec::<String>::new());
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_store_config_never_serializes_key() {
        let store = config();
        let json = serde_json::to_string(&store).unwrap();

        assert!(!json.contains("service-key"));
        assert!(!json.contains("api_key"));
        assert!(!format!("{:?}", store).contains("service-key"));
        assert!(!store.to_string().contains("service-key"));
    }

    #[test]
    fn test_store_config_deserializes_with_defaults() {
        let store: StoreConfig = serde_json::from_str(
            r#"{"url": "https://x.supabase.co", "api_key": "k", "table_name": "dq"}"#,
        )
        .unwrap();

        assert_eq!(store.api_key.expose(), "k");
        assert_eq!(store.on_conflict.len(), 4);
        assert_eq!(store.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_conflict_columns_must_be_metric_fields() {
        let error = config()
            .with_on_conflict(["date", "tbl"])
            .validate()
            .unwrap_err();
        assert!(error.to_string().contains("'date'"));

        let store = config().with_on_conflict(["metric_date", "table_name", "column_name"]);
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_conflict_columns_follow_mapping() {
        let mapping = FieldMapping::new([
            ("metric_date", "date"),
            ("table_name", "tbl"),
            ("column_name", "col"),
            ("missing_rows", "nulls"),
        ]);

        let store = config().with_on_conflict(["metric_date", "table_name", "column_name"]);
        assert_eq!(
            store.conflict_columns(Some(&mapping)).unwrap(),
            vec!["date", "tbl", "col"]
        );
        assert_eq!(
            store.conflict_columns(None).unwrap(),
            vec!["metric_date", "table_name", "column_name"]
        );

        // Default target includes pipeline_name, which this mapping drops
        let error = config().conflict_columns(Some(&mapping)).unwrap_err();
        assert!(error.to_string().contains("'pipeline_name'"));
    }
}
