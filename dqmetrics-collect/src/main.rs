//! Column completeness metrics pipeline.
//!
//! Reads configured CSV tables, measures how many rows of each required
//! column hold no value, writes the batch as JSON and upserts it into a
//! remote table store.
//!
//! # Security Guarantees
//! - Metrics carry counts only, never cell values
//! - Store API keys are never logged; store URLs are redacted

use anyhow::{Context, bail};
use clap::Parser;
use dqmetrics_collect::pipeline::{check_inputs, publish_file, run_pipeline};
use dqmetrics_collect::{Cli, Command, PublishArgs, RunArgs, StoreArgs};
use dqmetrics_core::clock::SystemClock;
use dqmetrics_core::config::{RequiredColumns, TableList, load_json_document};
use dqmetrics_core::store::{MetricStore, RestTableStore};
use dqmetrics_core::{init_logging, initialize_metrics_validator};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values from .env fill in whatever the environment does not set
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet, cli.global.log_dir.as_deref())?;

    initialize_metrics_validator().context("Failed to initialize metrics validator")?;

    match &cli.command {
        Command::Run(args) => run(args, cli.global.quiet).await,
        Command::Publish(args) => publish(args).await,
        Command::Check(args) => check(args, cli.global.quiet),
    }
}

/// Loads the table list and required columns documents.
fn load_inputs(args: &RunArgs) -> anyhow::Result<(TableList, RequiredColumns)> {
    let tables: TableList = load_json_document(&args.tables)
        .with_context(|| format!("Failed to load table list {}", args.tables.display()))?;
    let required: RequiredColumns = load_json_document(&args.required_columns).with_context(|| {
        format!(
            "Failed to load required columns {}",
            args.required_columns.display()
        )
    })?;
    Ok((tables, required))
}

/// Builds the remote store; a client that cannot be built stops the run.
fn build_store(
    config: Option<dqmetrics_core::config::StoreConfig>,
    args: &StoreArgs,
) -> anyhow::Result<Option<RestTableStore>> {
    let Some(config) = config else {
        info!("Remote store not configured, skipping upsert");
        return Ok(None);
    };

    let mapping = args.field_mapping()?;
    let store = RestTableStore::new(config, mapping).map_err(|e| {
        error!("Failed to create store client: {}", e);
        e
    })?;
    info!("Remote store: {}", store.describe());
    Ok(Some(store))
}

async fn run(args: &RunArgs, quiet: bool) -> anyhow::Result<()> {
    let config = args.pipeline_config()?;
    config.validate()?;
    let (tables, required) = load_inputs(args)?;

    let store = build_store(config.store.clone(), &args.store)?;
    let store_ref = store.as_ref().map(|s| s as &dyn MetricStore);

    let summary = run_pipeline(&config, &tables, &required, store_ref, &SystemClock).await?;

    if !quiet {
        println!("{}", summary);
    }

    Ok(())
}

async fn publish(args: &PublishArgs) -> anyhow::Result<()> {
    let Some(config) = args.store.store_config()? else {
        bail!("publish needs SUPABASE_URL, SUPABASE_API_KEY and TABLE_NAME");
    };
    config.validate()?;

    let Some(store) = build_store(Some(config), &args.store)? else {
        bail!("remote store unavailable");
    };

    if !publish_file(&args.input, &store).await? {
        bail!("store did not acknowledge {}", args.input.display());
    }

    println!("Published {}", args.input.display());
    Ok(())
}

fn check(args: &RunArgs, quiet: bool) -> anyhow::Result<()> {
    let config = args.pipeline_config()?;
    let (tables, required) = load_inputs(args)?;
    let mapping = args.store.field_mapping()?;
    if let Some(ref store) = config.store {
        store.validate()?;
        store.conflict_columns(mapping.as_ref())?;
    }

    let report = check_inputs(&config, &tables, &required)?;
    if !quiet {
        println!("Pipeline: {}", config.pipeline_name);
        println!("Tables: {}", report.tables);
        println!(
            "Tables without required columns: {}",
            report.tables_without_columns.len()
        );
        println!("Data directory present: {}", report.data_dir_exists);
    }

    if !report.is_runnable() {
        bail!("configuration is valid but a run would produce no metrics");
    }

    info!("✓ Configuration check passed");
    Ok(())
}
