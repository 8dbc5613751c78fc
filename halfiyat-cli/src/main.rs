//! Halfiyat CLI: fetch today's hal prices for the configured cities and persist them.
//!
//! With no arguments the configured city list is fetched and written to the
//! document store. Credentials come from `FIREBASE_SERVICE_ACCOUNT_JSON`;
//! a missing or invalid value aborts before any fetch.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use halfiyat_core::source::BlockingHttp;
use halfiyat_core::{CityId, CityRouter};
use halfiyat_runner::{
    init_logging, run_cities, write_snapshot, AppConfig, Credentials, DocumentStore,
    JsonFileStore, LogConfig, RunSummary, Snapshot,
};

#[derive(Parser)]
#[command(
    name = "halfiyat",
    version,
    about = "Halfiyat: daily wholesale produce-market price collector"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./halfiyat.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON snapshot of the fetched prices to this path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Fetch and export, but do not touch the document store.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// City to fetch (repeatable). Overrides the configured list.
    #[arg(long = "city", value_name = "CITY")]
    cities: Vec<String>,

    /// Treat this day (YYYY-MM-DD) as today. Defaults to the local date.
    #[arg(long)]
    date: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogConfig::from_env()).context("failed to initialise logging")?;

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if !cli.cities.is_empty() {
        config.cities = cli.cities.iter().map(|c| CityId::new(c)).collect();
    }
    if cli.output.is_some() {
        config.output = cli.output;
    }

    let today = cli
        .date
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--date must be YYYY-MM-DD")?
        .unwrap_or_else(|| Local::now().date_naive());

    let store = if cli.dry_run {
        info!("dry run: credentials not required, nothing will be persisted");
        None
    } else {
        let credentials = Credentials::from_env()?;
        Some(JsonFileStore::open(&config.store_dir, &credentials)?)
    };

    let router = CityRouter::from_catalog(
        &config.catalog(),
        Arc::new(BlockingHttp::new()),
        config.lookback_days,
    );
    let summary = run_cities(
        &router,
        store.as_ref().map(|s| s as &dyn DocumentStore),
        config.layout,
        &config.cities,
        today,
    );
    print_summary(&summary);

    if let Some(path) = &config.output {
        let snapshot = Snapshot::from_summary(&summary, Utc::now());
        write_snapshot(&snapshot, path)?;
        println!("Snapshot saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        if outcome.records.is_empty() {
            println!("{:<10} {}  no data", outcome.city, outcome.effective_date);
        } else {
            println!(
                "{:<10} {}  {} records, {} written",
                outcome.city,
                outcome.effective_date,
                outcome.records.len(),
                outcome.written
            );
        }
    }
    for failure in &summary.failures {
        eprintln!("Error: {failure}");
    }
}
