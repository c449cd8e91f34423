//! Export every stored tier table to its own GeoPackage.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use spectrum_tiers::config::Config;
use spectrum_tiers::gpkg::export_database_with;
use spectrum_tiers::store::DuckStore;

#[derive(Parser, Debug)]
#[command(name = "export")]
#[command(about = "Export DuckDB tier tables to GeoPackage")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DuckDB database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory for the .gpkg files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
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
    if let Some(output_dir) = args.output_dir {
        config.exporter.output_dir = output_dir;
    }

    info!("Spectrum Tier Exporter");
    info!("Database: {}", config.store.database.display());
    info!("Output: {}", config.exporter.output_dir.display());

    let store = DuckStore::open(&config.store.database).context("Failed to open store")?;

    let pb = ProgressBar::new(store.list_tables()?.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut invalid = 0usize;
    let written = export_database_with(
        &store,
        &config.exporter.output_dir,
        config.exporter.srs_id,
        |layer, _| {
            invalid += layer.invalid_geometries;
            pb.set_message(layer.name.clone());
            pb.inc(1);
        },
    )
    .with_context(|| {
        format!(
            "Failed to export to {}",
            config.exporter.output_dir.display()
        )
    })?;
    pb.finish_with_message("Export complete");

    info!("Exported {} tables", written.len());
    if invalid > 0 {
        warn!("{} rows exported without geometry", invalid);
    }
    Ok(())
}
