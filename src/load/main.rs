//! Service-area tier loader.
//!
//! Unpacks the tier archive, links each tier to the one above it and
//! appends the result to DuckDB.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use spectrum_tiers::config::Config;
use spectrum_tiers::store::DuckStore;
use spectrum_tiers::tiers::load_tiers;

#[derive(Parser, Debug)]
#[command(name = "load")]
#[command(about = "Load service-area tiers into DuckDB")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Zip archive of tier shapefiles (defaults to storage_dir/archive_name)
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// DuckDB database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Number of tiers to load
    #[arg(long)]
    tiers: Option<u8>,

    /// Drop existing tier tables before loading
    #[arg(long)]
    replace: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(database) = args.database {
        config.store.database = database;
    }
    if let Some(tiers) = args.tiers {
        config.loader.tier_count = tiers;
    }
    let archive = args
        .archive
        .unwrap_or_else(|| config.loader.archive_path());

    info!("Spectrum Tier Loader");
    info!("Archive: {}", archive.display());
    info!("Database: {}", config.store.database.display());

    let layers = load_tiers(&archive, config.loader.tier_count, &config.loader.area_id_column)
        .with_context(|| format!("Failed to load tiers from {}", archive.display()))?;
    if layers.is_empty() {
        warn!("No tiers found in {}", archive.display());
        return Ok(());
    }

    if let Some(parent) = config.store.database.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = DuckStore::open(&config.store.database).context("Failed to open store")?;

    if args.replace {
        for layer in &layers {
            store.drop_table(&layer.table_name())?;
        }
    }

    let pb = ProgressBar::new(layers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut loaded = Vec::with_capacity(layers.len());
    for layer in &layers {
        pb.set_message(layer.table_name());
        let mut tables = store
            .load_layers(std::slice::from_ref(layer))
            .with_context(|| format!("Failed to load {}", layer.table_name()))?;
        loaded.append(&mut tables);
        pb.inc(1);
    }
    pb.finish_with_message("Load complete");

    let tables = store.list_tables()?;
    info!("Tables in store: {}", tables.join(", "));
    for table in &loaded {
        info!(
            "  {}: {} rows appended{}",
            table.table,
            table.rows,
            if table.created { " (created)" } else { "" }
        );
    }

    if let Some(first) = tables.first() {
        info!("Structure of {}:", first);
        for (column, data_type) in store.describe_table(first)? {
            info!("  {} {}", column, data_type);
        }
        info!("  {} rows", store.count_rows(first)?);
    }

    Ok(())
}
