//! Metric persistence to a remote table store.
//!
//! [`MetricStore`] is the seam the pipeline upserts through. The shipped
//! implementation is [`RestTableStore`]; [`MemoryStore`] keeps rows in
//! process for dry runs and tests.
//!
//! # Security
//! Store API keys are held in [`crate::security::ApiKey`] and never logged.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::config::FieldMapping;
use crate::error::DqError;
use crate::quality::CompletenessMetric;

mod rest;

pub use rest::{PREFER_HEADER, RestTableStore, parse_ack};

/// Destination for metric records.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Short description for logs. Must not contain credentials.
    fn describe(&self) -> String;

    /// Inserts or updates all records in one batch.
    ///
    /// Returns the number of rows the store acknowledged.
    ///
    /// # Errors
    /// Returns `DqError::RemoteStore` if the store rejects the batch or
    /// cannot be reached.
    async fn upsert(&self, metrics: &[CompletenessMetric]) -> Result<usize>;
}

/// Converts metrics to store rows, renaming through `mapping` when given.
///
/// # Errors
/// Returns an error if a record cannot be serialized or a mapped field is
/// missing.
pub fn metrics_to_rows(
    metrics: &[CompletenessMetric],
    mapping: Option<&FieldMapping>,
) -> Result<Vec<Value>> {
    metrics
        .iter()
        .map(|metric| match mapping {
            Some(mapping) => mapping.apply(metric).map(Value::Object),
            None => serde_json::to_value(metric)
                .map_err(|e| DqError::serialization("Failed to serialize metric row", e)),
        })
        .collect()
}

/// Upserts metrics and logs the outcome.
///
/// Returns `true` only when the store acknowledged the batch. An empty batch
/// sends no request and returns `false`.
pub async fn publish_metrics<S>(store: &S, metrics: &[CompletenessMetric]) -> bool
where
    S: MetricStore + ?Sized,
{
    if metrics.is_empty() {
        tracing::warn!("No records to insert into {}", store.describe());
        return false;
    }

    match store.upsert(metrics).await {
        Ok(acknowledged) => {
            tracing::info!(
                "✓ Upserted {} record(s) into {}",
                acknowledged,
                store.describe()
            );
            true
        }
        Err(e) => {
            tracing::error!("Failed to insert metrics into {}: {}", store.describe(), e);
            false
        }
    }
}

/// Keeps upserted rows in memory, keyed like the remote conflict target.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<CompletenessMetric>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored rows in insertion order.
    pub fn rows(&self) -> Vec<CompletenessMetric> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    fn describe(&self) -> String {
        "memory store".to_string()
    }

    async fn upsert(&self, metrics: &[CompletenessMetric]) -> Result<usize> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| DqError::remote_store_message("memory store lock poisoned"))?;

        for metric in metrics {
            let existing = rows.iter_mut().find(|row| {
                row.pipeline_name == metric.pipeline_name
                    && row.metric_date == metric.metric_date
                    && row.table_name == metric.table_name
                    && row.column_name == metric.column_name
            });
            match existing {
                Some(row) => *row = metric.clone(),
                None => rows.push(metric.clone()),
            }
        }

        Ok(metrics.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStamp;
    use crate::quality::build_metric_record;

    fn stamp(time: &str) -> RunStamp {
        RunStamp {
            run_timestamp: format!("2026-02-05 {}", time),
            metric_date: "2026-02-05".to_string(),
        }
    }

    struct RejectingStore;

    #[async_trait]
    impl MetricStore for RejectingStore {
        fn describe(&self) -> String {
            "rejecting store".to_string()
        }

        async fn upsert(&self, _metrics: &[CompletenessMetric]) -> Result<usize> {
            Err(DqError::remote_store_message("store returned 500"))
        }
    }

    #[test]
    fn test_rows_without_mapping_keep_all_fields() {
        let metrics = vec![build_metric_record("p", &stamp("10:00:00"), "t", "c", 4, 1)];

        let rows = metrics_to_rows(&metrics, None).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_object().unwrap().len(), 8);
        assert_eq!(rows[0]["missing_percentage"], 25.0);
    }

    #[test]
    fn test_rows_with_mapping_are_renamed() {
        let metrics = vec![build_metric_record("p", &stamp("10:00:00"), "t", "c", 4, 1)];
        let mapping = FieldMapping::new([("table_name", "tbl"), ("column_name", "col")]);

        let rows = metrics_to_rows(&metrics, Some(&mapping)).unwrap();

        assert_eq!(rows[0], serde_json::json!({"tbl": "t", "col": "c"}));
    }

    #[tokio::test]
    async fn test_memory_store_merges_duplicates() {
        let store = MemoryStore::new();
        let first = build_metric_record("p", &stamp("10:00:00"), "t", "c", 4, 1);
        let rerun = build_metric_record("p", &stamp("11:00:00"), "t", "c", 4, 2);

        assert!(publish_metrics(&store, &[first]).await);
        assert!(publish_metrics(&store, &[rerun.clone()]).await);

        assert_eq!(store.rows(), vec![rerun]);
    }

    #[tokio::test]
    async fn test_publish_empty_batch_sends_nothing() {
        let store = MemoryStore::new();

        assert!(!publish_metrics(&store, &[]).await);
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_returns_false() {
        let metrics = vec![build_metric_record("p", &stamp("10:00:00"), "t", "c", 4, 1)];

        assert!(!publish_metrics(&RejectingStore, &metrics).await);
    }
}
