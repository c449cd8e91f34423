//! Spectrum decision crawler.
//!
//! Walks the decision listing newest-first, visits every decision page
//! published since the last run and logs the parsed table rows.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use spectrum_tiers::config::Config;
use spectrum_tiers::crawler::{BrowserSession, Crawler};

#[derive(Parser, Debug)]
#[command(name = "crawl")]
#[command(about = "Crawl spectrum licence decisions since the last visit")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the cursor file location
    #[arg(long)]
    cursor_file: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(path) = args.cursor_file {
        config.crawler.cursor_file = path;
    }
    if args.headed {
        config.crawler.headless = false;
    }

    info!("Spectrum Decision Crawler");
    info!("Listing: {}", config.crawler.listing_url());

    let crawler = Crawler::new(&config.crawler).context("Invalid crawler configuration")?;
    let mut session = BrowserSession::launch(&config.crawler)
        .await
        .context("Failed to launch browser")?;

    let summary = crawler.run(&mut session).await;
    session.close().await;

    if !summary.listing_fetched {
        anyhow::bail!("Listing page {} could not be fetched", config.crawler.listing_url());
    }

    info!(
        "Crawl complete: {} new links, {} pages visited, {} skipped, {} records",
        summary.new_links, summary.pages_visited, summary.pages_skipped, summary.records
    );
    Ok(())
}
