mod airtable;
mod classifier;
mod cli;
mod config;
mod error;
mod openai;
mod park;
mod region;
mod report;
mod sync;
mod ui;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use airtable::AirtableClient;
use classifier::RegionClassifier;
use cli::{Cli, Command, SyncArgs};
use config::SyncConfig;
use openai::OpenAiClient;
use sync::{SyncOptions, Synchronizer};
use ui::SyncProgress;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let progress = SyncProgress::new();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(progress.writer())
        .init();

    let mut config = SyncConfig::load()?;

    match cli.command {
        Command::Sync(args) => run_sync(&mut config, args, &progress).await,
        Command::Report => run_report(&config).await,
    }
}

fn store_for(config: &SyncConfig) -> AirtableClient {
    AirtableClient::with_base_url(
        config.airtable_token.clone(),
        config.airtable_base_id.clone(),
        config.airtable_table_name.clone(),
        config.airtable_url.clone(),
    )
}

async fn run_sync(
    config: &mut SyncConfig,
    args: SyncArgs,
    progress: &SyncProgress,
) -> Result<()> {
    if let Some(key) = args.api_key {
        config.openai_api_key = key;
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    config.validate(true)?;

    let options = SyncOptions {
        dry_run: args.test,
        limit: args.limit.map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
        record_id: args.id,
        name_filter: args.name,
        force: args.force,
        page_size: config.page_size,
        delay: config.delay(),
    };
    ui::print_header(&options, &config.model);

    let store = store_for(config);
    let completions =
        OpenAiClient::with_base_url(config.openai_api_key.clone(), config.openai_url.clone());
    let classifier = RegionClassifier::new(completions, config.model.clone());

    info!(model = classifier.model(), "fetching parks from Airtable");
    let outcome = Synchronizer::new(&store, &classifier, options.clone())
        .run(progress)
        .await?;
    ui::print_summary(&outcome, &options);

    if outcome.wrote_any() {
        info!("generating regions report");
        match report::recount(&store, config.page_size).await {
            Ok(tally) => ui::print_regions_report(&tally),
            Err(e) => error!(error = %e, "error generating regions report"),
        }
    }
    Ok(())
}

async fn run_report(config: &SyncConfig) -> Result<()> {
    config.validate(false)?;
    let store = store_for(config);

    info!("fetching parks from Airtable");
    let tally = report::recount(&store, config.page_size)
        .await
        .map_err(crate::error::SyncError::Fetch)?;
    info!(total = tally.total, "fetched parks");
    ui::print_detailed_report(&tally);
    Ok(())
}
