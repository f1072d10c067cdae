//! Pipeline entry points: run, publish and check.
//!
//! The checker runs synchronously; only the file write and the store upsert
//! are awaited.

use std::path::Path;

use dqmetrics_core::clock::Clock;
use dqmetrics_core::config::{PipelineConfig, RequiredColumns, TableList};
use dqmetrics_core::models::{PipelineSummary, RunStamp};
use dqmetrics_core::output::{load_metrics_json, save_metrics_json};
use dqmetrics_core::quality::{CompletenessChecker, FailureLog, tables_processed};
use dqmetrics_core::source::CsvDirectorySource;
use dqmetrics_core::store::{MetricStore, publish_metrics};
use tracing::{info, warn};

/// Runs one batch: score tables, save the metrics file, upsert.
///
/// Per-table and per-column problems are logged and counted in the summary.
/// A metrics file that cannot be written fails the run; a failed upsert only
/// leaves `db_saved` false.
///
/// # Errors
/// Returns an error if the configuration is invalid or the metrics file
/// cannot be written.
pub async fn run_pipeline<C: Clock>(
    config: &PipelineConfig,
    tables: &TableList,
    required: &RequiredColumns,
    store: Option<&dyn MetricStore>,
    clock: &C,
) -> dqmetrics_core::Result<PipelineSummary> {
    config.validate()?;

    info!("Starting pipeline '{}'", config.pipeline_name);
    info!("Data: {}", config.data_dir.display());

    let source = CsvDirectorySource::new(&config.data_dir).with_options(config.csv.clone());
    let checker = CompletenessChecker::new(config.pipeline_name.clone()).with_clock(clock);
    let mut failures = FailureLog::new();

    let metrics = checker.run(&tables.tables, required, &source, &mut failures);

    let mut summary = PipelineSummary::new(config.pipeline_name.clone());
    summary.tables_processed = tables_processed(&metrics);
    summary.metrics_generated = metrics.len();
    summary.failures = failures.counts_by_kind();

    if config.output.enabled {
        let metric_date = metrics
            .first()
            .map_or_else(|| RunStamp::capture(clock).metric_date, |m| m.metric_date.clone());
        let path = config.output.resolve_path(&metric_date);
        save_metrics_json(&metrics, &path).await?;
        summary.json_saved = true;
    }

    if let Some(store) = store {
        summary.db_saved = publish_metrics(store, &metrics).await;
    }

    if summary.failure_count() > 0 {
        warn!(
            "Pipeline '{}' finished with {} failure(s)",
            summary.pipeline,
            summary.failure_count()
        );
    } else {
        info!("✓ Pipeline '{}' completed", summary.pipeline);
    }

    Ok(summary)
}

/// Upserts a previously saved metrics file. Returns whether the store
/// acknowledged it.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid metrics
/// document.
pub async fn publish_file(path: &Path, store: &dyn MetricStore) -> dqmetrics_core::Result<bool> {
    info!("Publishing {}", path.display());
    let metrics = load_metrics_json(path).await?;
    Ok(publish_metrics(store, &metrics).await)
}

/// Result of a configuration check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Tables in the table list
    pub tables: usize,
    /// Listed tables with no required columns configured
    pub tables_without_columns: Vec<String>,
    /// Whether the data directory exists
    pub data_dir_exists: bool,
}

impl CheckReport {
    /// Whether a run with these inputs would measure anything.
    pub fn is_runnable(&self) -> bool {
        self.tables > 0 && self.data_dir_exists && self.tables_without_columns.len() < self.tables
    }
}

/// Validates configuration and inputs without reading any table.
///
/// # Errors
/// Returns an error if the configuration is invalid.
pub fn check_inputs(
    config: &PipelineConfig,
    tables: &TableList,
    required: &RequiredColumns,
) -> dqmetrics_core::Result<CheckReport> {
    config.validate()?;

    let tables_without_columns: Vec<String> = tables
        .tables
        .iter()
        .filter(|table| required.columns_for(table).is_none())
        .cloned()
        .collect();

    for table in &tables_without_columns {
        warn!("No required columns configured for table '{}'", table);
    }

    let data_dir_exists = config.data_dir.is_dir();
    if !data_dir_exists {
        warn!("Data directory {} does not exist", config.data_dir.display());
    }
    if tables.is_empty() {
        warn!("Table list is empty");
    }

    Ok(CheckReport {
        tables: tables.tables.len(),
        tables_without_columns,
        data_dir_exists,
    })
}
