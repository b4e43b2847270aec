//! Network builder (lyrnet-builder) - Main entry point
//!
//! Loads the song dataset and pronouncing dictionary from the root folder,
//! then writes one pruned phonetic network per English song. Per-song
//! failures are logged and summarized; only setup errors make the process
//! exit non-zero.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lyrnet_builder::config::BuilderConfig;
use lyrnet_builder::services::artifact_writer::ArtifactWriter;
use lyrnet_builder::services::batch_orchestrator::BatchOrchestrator;
use lyrnet_builder::services::candidate_builder::MultiScaleBuilder;
use lyrnet_builder::services::dataset_loader::load_songs;
use lyrnet_builder::services::network_verifier::verify_directory;
use lyrnet_builder::services::phoneme_mapper::PhonemeMapper;
use lyrnet_builder::services::pronouncing_dictionary::PronouncingDictionary;
use lyrnet_common::config::{ensure_writable_dir, load_toml_config, RootFolderResolver};

/// Command-line arguments for lyrnet-builder
#[derive(Parser, Debug)]
#[command(name = "lyrnet-builder")]
#[command(about = "Build pruned phonetic co-occurrence networks from song lyrics")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Root folder holding the dataset, dictionary and network output
    #[arg(short, long, global = true, env = "LYRNET_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build networks for every song without an artifact (default)
    Run {
        /// Worker threads (defaults to available CPU parallelism)
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Re-read written artifacts and check the pruning rules
    Verify,
}

fn main() -> Result<()> {
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

    let root_folder = RootFolderResolver::new("lyrnet-builder")
        .with_cli_arg(args.root_folder.clone())
        .with_toml_config(&toml_config)
        .resolve();
    info!("Root folder: {}", root_folder.display());

    match args.command.unwrap_or(Command::Run { workers: None }) {
        Command::Run { workers } => run(BuilderConfig::resolve(&root_folder, &toml_config, workers)),
        Command::Verify => verify(BuilderConfig::resolve(&root_folder, &toml_config, None)),
    }
}

fn run(config: BuilderConfig) -> Result<()> {
    // Setup failures abort before any song is touched
    ensure_writable_dir(&config.output_dir).context("Output directory unavailable")?;

    let dictionary = PronouncingDictionary::load(&config.dictionary_path)
        .context("Failed to load pronouncing dictionary")?;
    let (songs, _stats) = load_songs(&config.dataset_path).context("Failed to load dataset")?;

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            // Second Ctrl-C: stop now; partial temp files are removed by the next run
            std::process::exit(130);
        }
        warn!("Interrupt received; finishing in-flight songs (Ctrl-C again to stop now)");
    })
    .context("Failed to install Ctrl-C handler")?;

    let orchestrator = BatchOrchestrator::new(
        config.params,
        Arc::new(PhonemeMapper::new(Arc::new(dictionary))),
        Arc::new(MultiScaleBuilder::new()),
        ArtifactWriter::new(config.output_dir.clone()),
        config.workers,
    )
    .with_cancel_flag(cancel)
    .with_progress_bar(true);

    let summary = orchestrator.run(&songs)?;
    if summary.failed > 0 {
        warn!(
            failed = summary.failed,
            "Some songs failed; rerun to retry them after fixing the cause"
        );
    }

    Ok(())
}

fn verify(config: BuilderConfig) -> Result<()> {
    if !config.output_dir.is_dir() {
        bail!("No artifacts at {}", config.output_dir.display());
    }

    let report = verify_directory(&config.output_dir, &config.params);
    info!("{}", report.display_string());

    if !report.is_clean() {
        bail!(
            "{} of {} artifacts violate the pruning rules",
            report.violations.len(),
            report.checked
        );
    }
    Ok(())
}
