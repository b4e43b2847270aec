//! Configuration for lyrnet-crawler
//!
//! Defaults match the public WASABI API; every value can be overridden in
//! the `[crawler]` section of the TOML config file.

use lyrnet_common::config::TomlConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://wasabi.i3s.unice.fr/api/v1";
/// Songs per `song_all` page
pub const DEFAULT_BATCH_SIZE: u64 = 200;
/// Checkpoint when the batch start index is a multiple of this
pub const DEFAULT_CHECKPOINT_EVERY: u64 = 200;
/// Fixed wait after a rate-limit reply
pub const DEFAULT_RATE_LIMIT_BACKOFF_SECS: u64 = 10;
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub base_url: String,
    pub batch_size: u64,
    pub checkpoint_every: u64,
    pub rate_limit_backoff: Duration,
    pub requests_per_second: u32,
    /// Where checkpoints and the final table are written
    pub output_dir: PathBuf,
}

impl CrawlerConfig {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            rate_limit_backoff: Duration::from_secs(DEFAULT_RATE_LIMIT_BACKOFF_SECS),
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Apply `[crawler]` overrides; zero sizes fall back to the defaults
    pub fn resolve(output_dir: &Path, toml_config: &TomlConfig) -> Self {
        let section = &toml_config.crawler;
        let mut config = Self::new(output_dir);

        if let Some(url) = &section.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(size) = section.batch_size.filter(|&n| n > 0) {
            config.batch_size = size as u64;
        }
        if let Some(every) = section.checkpoint_every.filter(|&n| n > 0) {
            config.checkpoint_every = every as u64;
        }
        if let Some(secs) = section.rate_limit_backoff_secs {
            config.rate_limit_backoff = Duration::from_secs(secs);
        }
        if let Some(rps) = section.requests_per_second.filter(|&n| n > 0) {
            config.requests_per_second = rps;
        }

        config
    }
}
