//! Dataset crawler (lyrnet-crawler) - Main entry point
//!
//! Usage: `lyrnet-crawler <left> <right>` downloads songs with index in
//! `[left, right)` and writes `wasabi_songs.csv` to the root folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lyrnet_common::config::{ensure_writable_dir, load_toml_config, RootFolderResolver};
use lyrnet_crawler::services::wasabi_client::WasabiClient;
use lyrnet_crawler::{Crawler, CrawlerConfig};

/// Command-line arguments for lyrnet-crawler
#[derive(Parser, Debug)]
#[command(name = "lyrnet-crawler")]
#[command(about = "Download songs from the WASABI song index")]
#[command(version)]
struct Args {
    /// First song index to fetch
    left: u64,

    /// Stop before this song index
    right: u64,

    /// Output folder (also holds the builder's input)
    #[arg(short, long, env = "LYRNET_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_toml_config();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder = RootFolderResolver::new("lyrnet-crawler")
        .with_cli_arg(args.root_folder)
        .with_toml_config(&toml_config)
        .resolve();
    ensure_writable_dir(&root_folder).context("Output folder unavailable")?;
    info!("Root folder: {}", root_folder.display());

    let config = CrawlerConfig::resolve(&root_folder, &toml_config);
    let client = WasabiClient::new(&config).context("Failed to build HTTP client")?;

    let summary = Crawler::new(client, config)
        .with_progress_bar(true)
        .crawl(args.left, args.right)
        .await
        .context("Crawl failed")?;

    info!("Dataset written to {}", summary.output.display());
    Ok(())
}
