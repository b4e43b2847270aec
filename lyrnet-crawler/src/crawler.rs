//! Crawl loop
//!
//! Walks the song index in pages of `batch_size` from `left` up to (not
//! including) `right`. Every song in a page gets its genre resolved, then
//! the row is appended to the in-memory table. The full table is saved as a
//! checkpoint whenever the page start is a positive multiple of
//! `checkpoint_every`, and once more as the final output.

use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::services::dataset_writer::{checkpoint_path, final_path, SongTable};
use crate::services::genre_resolver::{resolve_genre, AlbumGenreCache};
use crate::services::wasabi_client::{field_text, SongApi};
use indicatif::{ProgressBar, ProgressStyle};
use lyrnet_common::song::{COL_ID, CRAWL_FIELDS};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    pub batches: usize,
    pub songs: usize,
    /// Songs whose genre lookup failed and were written with an empty genre
    pub genre_failures: usize,
    pub album_cache_hits: usize,
    pub checkpoints: Vec<PathBuf>,
    pub output: PathBuf,
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn display_string(&self) -> String {
        format!(
            "{} songs in {} batches ({} genre lookups failed, {} album cache hits) in {:.1}s",
            self.songs,
            self.batches,
            self.genre_failures,
            self.album_cache_hits,
            self.elapsed.as_secs_f64()
        )
    }
}

pub struct Crawler<A: SongApi> {
    api: A,
    config: CrawlerConfig,
    fields: Vec<&'static str>,
    show_progress: bool,
}

impl<A: SongApi> Crawler<A> {
    pub fn new(api: A, config: CrawlerConfig) -> Self {
        Self {
            api,
            config,
            fields: CRAWL_FIELDS.to_vec(),
            show_progress: false,
        }
    }

    /// Request a different projection (the song id must stay first)
    pub fn with_fields(mut self, fields: &[&'static str]) -> Self {
        self.fields = fields.to_vec();
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Page start indices for `[left, right)`
    pub fn batch_starts(&self, left: u64, right: u64) -> Vec<u64> {
        (left..right)
            .step_by(self.config.batch_size.max(1) as usize)
            .collect()
    }

    fn is_checkpoint(&self, start: u64) -> bool {
        self.config.checkpoint_every > 0 && start > 0 && start % self.config.checkpoint_every == 0
    }

    pub async fn crawl(&self, left: u64, right: u64) -> Result<CrawlSummary, CrawlError> {
        if left > right {
            return Err(CrawlError::InvalidRange { left, right });
        }
        std::fs::create_dir_all(&self.config.output_dir).map_err(|source| CrawlError::Write {
            path: self.config.output_dir.clone(),
            source,
        })?;

        let starts = self.batch_starts(left, right);
        info!(
            left,
            right,
            batches = starts.len(),
            base_url = %self.config.base_url,
            "Starting crawl"
        );

        let start_time = Instant::now();
        let progress = self.progress_bar(starts.len());
        let mut table = SongTable::new(&self.fields);
        let mut cache = AlbumGenreCache::new();
        let mut summary = CrawlSummary::default();

        for start in starts {
            let songs = self.api.song_batch(start, &self.fields).await?;

            for song in &songs {
                let mut row: Vec<String> = self.fields.iter().map(|f| field_text(song, f)).collect();
                let song_id = field_text(song, COL_ID);
                let genre = match resolve_genre(&self.api, &mut cache, &song_id).await {
                    Ok(genre) => genre,
                    Err(e) => {
                        warn!(song_id = %song_id, error = %e, "Genre lookup failed");
                        summary.genre_failures += 1;
                        String::new()
                    }
                };
                row.push(genre);
                table.push_row(row);
            }

            summary.batches += 1;
            summary.songs += songs.len();
            progress.inc(1);

            if self.is_checkpoint(start) {
                let path = checkpoint_path(&self.config.output_dir, start);
                table.save(&path)?;
                summary.checkpoints.push(path);
            }
        }
        progress.finish_and_clear();

        let output = final_path(&self.config.output_dir);
        table.save(&output)?;

        summary.output = output;
        summary.album_cache_hits = cache.hits();
        summary.elapsed = start_time.elapsed();
        info!("Crawl finished: {}", summary.display_string());

        Ok(summary)
    }

    fn progress_bar(&self, batches: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(batches as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} batches ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        progress
    }
}
