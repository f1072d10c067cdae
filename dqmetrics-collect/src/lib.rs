//! Library module for dqmetrics-collect
//!
//! Holds the CLI definition and the pipeline entry points so both can be
//! tested without spawning the binary. `main.rs` only wires them together.
//!
//! Environment variables are read here, at the CLI edge, through clap's
//! `env` support. Everything past this module receives plain values.

pub mod pipeline;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dqmetrics_core::config::{
    FieldMapping, OutputConfig, PipelineConfig, PipelineDocument, StoreConfig, load_json_document,
};
use dqmetrics_core::error::DqError;
use dqmetrics_core::security::ApiKey;

/// CLI argument structure
#[derive(Parser, Debug)]
#[command(name = "dqmetrics-collect")]
#[command(about = "Column completeness metrics for CSV tables")]
#[command(version)]
#[command(long_about = "
dqmetrics-collect - column completeness metrics

Scores every required column of every configured table by the share of
rows holding no value, writes the batch as JSON and optionally upserts it
into a PostgREST/Supabase table.

ENVIRONMENT:
  DQ_PIPELINE_NAME, DQ_DATA_PATH     pipeline identity and data directory
  OUTPUT_PATH, METRIC_NAME           metrics file location
  SUPABASE_URL, SUPABASE_API_KEY     remote store connection
  TABLE_NAME                         remote store table
  A .env file in the working directory is loaded first.

EXAMPLES:
  dqmetrics-collect run --config config/pipeline.json
  dqmetrics-collect run --pipeline-name daily --data-dir data --no-store
  dqmetrics-collect publish output/2026-02-05/completeness_metrics.json
  dqmetrics-collect check --config config/pipeline.json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score tables, save the metrics file and upsert it
    Run(RunArgs),
    /// Upsert a previously saved metrics file
    Publish(PublishArgs),
    /// Validate configuration and input documents without reading tables
    Check(RunArgs),
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,

    /// Directory for daily log files
    #[arg(
        long,
        global = true,
        env = "DQ_LOG_DIR",
        value_name = "DIR",
        help = "Also append logs to DIR/dq_metrics_YYYY_MM_DD.log"
    )]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline document
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Pipeline document: {\"pipeline\": {\"name\"}, \"paths\": {\"data\"}}"
    )]
    pub config: Option<PathBuf>,

    /// Pipeline name
    #[arg(long, env = "DQ_PIPELINE_NAME", help = "Pipeline name, overrides the document")]
    pub pipeline_name: Option<String>,

    /// Data directory
    #[arg(
        long,
        env = "DQ_DATA_PATH",
        value_name = "DIR",
        help = "Directory of <table>.csv files, overrides the document"
    )]
    pub data_dir: Option<PathBuf>,

    /// Table list document
    #[arg(
        long,
        value_name = "FILE",
        default_value = "config/tables.json",
        help = "Table list: {\"tables\": [...]}"
    )]
    pub tables: PathBuf,

    /// Required columns document
    #[arg(
        long,
        value_name = "FILE",
        default_value = "config/required_columns.json",
        help = "Required columns: {\"table\": [\"column\", ...]}"
    )]
    pub required_columns: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Skip the metrics file
    #[arg(long, help = "Do not write the metrics file")]
    pub no_json: bool,

    /// Skip the remote store
    #[arg(long, help = "Do not upsert into the remote store")]
    pub no_store: bool,
}

#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Base output directory
    #[arg(long, env = "OUTPUT_PATH", value_name = "DIR", help = "Base directory for metrics files")]
    pub output_dir: Option<PathBuf>,

    /// Metrics file name
    #[arg(long, env = "METRIC_NAME", help = "Metrics file name")]
    pub metric_name: Option<String>,

    /// Exact output path
    #[arg(short, long, value_name = "FILE", help = "Write metrics to FILE exactly")]
    pub output: Option<PathBuf>,

    /// Disable the dated directory
    #[arg(long, help = "Do not nest the metrics file under a YYYY-MM-DD directory")]
    pub undated: bool,
}

#[derive(Args, Debug, Default)]
pub struct StoreArgs {
    /// Store base URL
    #[arg(long, env = "SUPABASE_URL", hide_env_values = true, help = "Remote store base URL")]
    pub store_url: Option<String>,

    /// Store API key
    #[arg(
        long,
        env = "SUPABASE_API_KEY",
        hide_env_values = true,
        help = "Remote store API key (prefer the environment variable)"
    )]
    pub store_api_key: Option<String>,

    /// Store table
    #[arg(long, env = "TABLE_NAME", help = "Remote store table")]
    pub store_table: Option<String>,

    /// Field mapping document
    #[arg(
        long,
        env = "OUTPUT_FORMAT_PATH",
        value_name = "FILE",
        help = "Field mapping: {\"metric_field\": \"store_column\"}"
    )]
    pub field_mapping: Option<PathBuf>,

    /// Conflict target override
    #[arg(
        long,
        env = "DQ_STORE_ON_CONFLICT",
        value_delimiter = ',',
        value_name = "FIELDS",
        help = "Metric fields forming the upsert conflict target [default: pipeline_name,metric_date,table_name,column_name]"
    )]
    pub store_on_conflict: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Saved metrics file
    #[arg(value_name = "FILE", help = "Metrics file written by `run`")]
    pub input: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl RunArgs {
    /// Builds the pipeline configuration from the document and overrides.
    ///
    /// # Errors
    /// Returns a configuration error if no pipeline name or data directory
    /// is available, or if the pipeline document cannot be loaded.
    pub fn pipeline_config(&self) -> dqmetrics_core::Result<PipelineConfig> {
        let mut config = match self.config {
            Some(ref path) => load_json_document::<PipelineDocument>(path)?.into_config(),
            None => {
                let name = self.pipeline_name.clone().ok_or_else(|| {
                    DqError::configuration(
                        "pipeline name required: use --config, --pipeline-name or DQ_PIPELINE_NAME",
                    )
                })?;
                let data_dir = self.data_dir.clone().ok_or_else(|| {
                    DqError::configuration(
                        "data directory required: use --config, --data-dir or DQ_DATA_PATH",
                    )
                })?;
                PipelineConfig::new(name, data_dir)
            }
        };

        if let Some(ref name) = self.pipeline_name {
            config.pipeline_name = name.clone();
        }
        if let Some(ref data_dir) = self.data_dir {
            config.data_dir = data_dir.clone();
        }

        config.output = self.output.apply(config.output.clone());
        config.output.enabled = !self.no_json;

        if !self.no_store {
            config.store = self.store.store_config()?;
        }

        Ok(config)
    }
}

impl OutputArgs {
    /// Applies CLI overrides on top of `base`.
    pub fn apply(&self, base: OutputConfig) -> OutputConfig {
        let mut output = base;
        if let Some(ref dir) = self.output_dir {
            output.output_dir = dir.clone();
        }
        if let Some(ref name) = self.metric_name {
            output.metric_name = name.clone();
        }
        if let Some(ref path) = self.output {
            output.path_override = Some(path.clone());
        }
        if self.undated {
            output.dated = false;
        }
        output
    }
}

impl StoreArgs {
    /// Store settings, or `None` when no store option is set at all.
    ///
    /// # Errors
    /// Returns a configuration error naming the missing settings when only
    /// some of URL, API key and table are given.
    pub fn store_config(&self) -> dqmetrics_core::Result<Option<StoreConfig>> {
        match (&self.store_url, &self.store_api_key, &self.store_table) {
            (None, None, None) => Ok(None),
            (Some(url), Some(key), Some(table)) => {
                let config = StoreConfig::new(url.clone(), ApiKey::new(key.clone()), table.clone());
                if self.store_on_conflict.is_empty() {
                    Ok(Some(config))
                } else {
                    Ok(Some(config.with_on_conflict(self.store_on_conflict.iter().cloned())))
                }
            }
            (url, key, table) => {
                let missing: Vec<&str> = [
                    (url.is_none(), "SUPABASE_URL"),
                    (key.is_none(), "SUPABASE_API_KEY"),
                    (table.is_none(), "TABLE_NAME"),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(DqError::configuration(format!(
                    "incomplete store settings, missing: {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Loads the field mapping document, if configured.
    ///
    /// # Errors
    /// Returns an error if the document cannot be read or fails validation.
    pub fn field_mapping(&self) -> dqmetrics_core::Result<Option<FieldMapping>> {
        let Some(ref path) = self.field_mapping else {
            return Ok(None);
        };

        let mapping: FieldMapping = load_json_document(path)?;
        mapping.validate()?;
        Ok(Some(mapping))
    }
}
