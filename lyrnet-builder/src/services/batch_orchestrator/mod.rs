//! Batch orchestrator
//!
//! Runs one independent job per song on a dedicated rayon pool:
//! tokenize/map -> build candidate graph -> label -> prune -> write.
//! A failing song (error or panic) is reported and never affects the
//! others. Songs whose artifact already exists are skipped, so rerunning an
//! interrupted batch only processes what is missing.

mod statistics;

pub use statistics::{BatchSummary, FailedSong};

use crate::config::NetworkParams;
use crate::error::SongError;
use crate::graph::vertex_position;
use crate::models::{JobOutcome, JobReport, JobState, SongJob, SongRecord};
use crate::services::artifact_writer::{ArtifactError, ArtifactWriter};
use crate::services::candidate_builder::CandidateGraphBuilder;
use crate::services::edge_pruner::prune;
use crate::services::phoneme_mapper::PhonemeMapper;
use indicatif::{ProgressBar, ProgressStyle};
use lyrnet_common::fs::remove_stale_temp_files;
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// An info line is logged every this many processed songs
pub const PROGRESS_LOG_INTERVAL: usize = 1000;

/// Fatal errors raised before any job is dispatched
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Cannot prepare output directory: {0}")]
    OutputDir(#[from] std::io::Error),

    #[error("Cannot build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub struct BatchOrchestrator {
    params: NetworkParams,
    mapper: Arc<PhonemeMapper>,
    builder: Arc<dyn CandidateGraphBuilder>,
    writer: ArtifactWriter,
    workers: usize,
    cancel: Arc<AtomicBool>,
    show_progress: bool,
}

impl BatchOrchestrator {
    pub fn new(
        params: NetworkParams,
        mapper: Arc<PhonemeMapper>,
        builder: Arc<dyn CandidateGraphBuilder>,
        writer: ArtifactWriter,
        workers: usize,
    ) -> Self {
        Self {
            params,
            mapper,
            builder,
            writer,
            workers: workers.max(1),
            cancel: Arc::new(AtomicBool::new(false)),
            show_progress: false,
        }
    }

    /// Share an abort flag (set from the Ctrl-C handler)
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Draw a terminal progress bar while running
    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Process every song; per-song failures are part of the summary
    pub fn run(&self, songs: &[SongRecord]) -> Result<BatchSummary, BatchError> {
        std::fs::create_dir_all(self.writer.output_dir())?;
        let stale = remove_stale_temp_files(self.writer.output_dir())?;
        if stale > 0 {
            warn!(stale, "Removed partial files left by an interrupted run");
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("lyrnet-worker-{}", i))
            .build()?;

        let total = songs.len();
        info!(
            songs = total,
            workers = self.workers,
            window_size = self.params.window_size(),
            k_expected = self.params.k_expected(),
            output_dir = %self.writer.output_dir().display(),
            "Starting batch"
        );

        let start_time = Instant::now();
        let progress = self.progress_bar(total);
        let processed = AtomicUsize::new(0);

        let reports: Vec<JobReport> = pool.install(|| {
            songs
                .par_iter()
                .map(|song| {
                    let report = self.process_song(song);

                    progress.inc(1);
                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % PROGRESS_LOG_INTERVAL == 0 {
                        let elapsed = start_time.elapsed().as_secs_f64();
                        let rate = if elapsed > 0.0 {
                            count as f64 / elapsed
                        } else {
                            0.0
                        };
                        info!(
                            "Batch progress: {}/{} ({:.1}%) | Rate: {:.1} songs/sec",
                            count,
                            total,
                            count as f64 / total as f64 * 100.0,
                            rate
                        );
                    }

                    report
                })
                .collect()
        });
        progress.finish_and_clear();

        let summary = BatchSummary::from_reports(&reports, start_time.elapsed());
        if summary.cancelled > 0 {
            warn!(
                cancelled = summary.cancelled,
                "Batch aborted; unstarted songs will be processed on the next run"
            );
        }
        info!("Batch finished: {}", summary.display_string());

        Ok(summary)
    }

    /// Run the job for one song; never panics and never returns an error
    pub fn process_song(&self, song: &SongRecord) -> JobReport {
        let started = Instant::now();
        let mut job = SongJob::new(song.id.as_str());

        let outcome = if self.cancel.load(Ordering::Relaxed) {
            JobOutcome::Cancelled
        } else {
            match self.writer.exists(&song.id) {
                Ok(true) => {
                    job.transition_to(JobState::Skipped);
                    debug!(song_id = %song.id, "Artifact exists, skipping");
                    JobOutcome::Skipped
                }
                Ok(false) => {
                    job.transition_to(JobState::Processing);
                    let result = catch_unwind(AssertUnwindSafe(|| self.build_artifact(song)))
                        .unwrap_or_else(|payload| Err(SongError::Panic(panic_message(payload))));
                    self.finish(&mut job, result)
                }
                Err(e) => {
                    job.transition_to(JobState::Processing);
                    self.finish(&mut job, Err(e.into()))
                }
            }
        };

        JobReport {
            song_id: song.id.clone(),
            outcome,
            final_state: job.state,
            elapsed: started.elapsed(),
        }
    }

    fn finish(&self, job: &mut SongJob, result: Result<(usize, usize), SongError>) -> JobOutcome {
        match result {
            Ok((vertices, edges)) => {
                job.transition_to(JobState::Done);
                debug!(song_id = %job.song_id, vertices, edges, "Artifact written");
                JobOutcome::Done { vertices, edges }
            }
            // Another job with the same id got there first
            Err(SongError::Artifact(ArtifactError::AlreadyExists(_))) => {
                job.transition_to(JobState::Skipped);
                JobOutcome::Skipped
            }
            Err(e) => {
                job.transition_to(JobState::Failed);
                warn!(song_id = %job.song_id, error = %e, "Song failed");
                JobOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// All pipeline stages for one song; returns written vertex and edge counts
    fn build_artifact(&self, song: &SongRecord) -> Result<(usize, usize), SongError> {
        let (phonemes, stats) = self.mapper.phonemes_for(&song.lyrics);
        debug!(
            song_id = %song.id,
            tokens = stats.tokens,
            recognized = stats.recognized,
            phonemes = phonemes.len(),
            "Mapped lyrics to phonemes"
        );

        let window_size = self.params.window_size();
        let mut graph = self.builder.build(&phonemes, window_size)?;
        let labels = vertex_labels(&phonemes, graph.vertex_count(), window_size)?;
        prune(&mut graph, &self.params);

        self.writer.write(&song.id, &graph, &labels)?;
        Ok((graph.vertex_count(), graph.edge_count()))
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        // Draws to stderr, which indicatif leaves blank when it is not a terminal
        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}, {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );
        progress
    }
}

/// Label of vertex `i` is the phoneme at `vertex_position(i, window_size)`
pub fn vertex_labels(
    phonemes: &[String],
    vertex_count: usize,
    window_size: usize,
) -> Result<Vec<String>, SongError> {
    if vertex_count == 0 {
        return Ok(Vec::new());
    }
    let offset = vertex_position(0, window_size);
    let end = offset + vertex_count;
    if end > phonemes.len() {
        return Err(SongError::LabelMismatch {
            vertices: vertex_count,
            phonemes: phonemes.len(),
            offset,
        });
    }
    Ok(phonemes[offset..end].to_vec())
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, GraphError};
    use crate::services::candidate_builder::MultiScaleBuilder;
    use crate::services::pronouncing_dictionary::PronouncingDictionary;
    use lyrnet_common::fs::TEMP_PREFIX;
    use tempfile::TempDir;

    fn seq(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn mapper() -> Arc<PhonemeMapper> {
        let dict = PronouncingDictionary::parse("cat K AE1 T\ndog D AO1 G\n").unwrap();
        Arc::new(PhonemeMapper::new(Arc::new(dict)))
    }

    fn orchestrator(dir: &TempDir, builder: Arc<dyn CandidateGraphBuilder>) -> BatchOrchestrator {
        BatchOrchestrator::new(
            NetworkParams::new(3, 20).unwrap(),
            mapper(),
            builder,
            ArtifactWriter::new(dir.path()),
            2,
        )
    }

    struct PanickingBuilder;

    impl CandidateGraphBuilder for PanickingBuilder {
        fn build(&self, _phonemes: &[String], _window_size: usize) -> Result<Graph, GraphError> {
            panic!("builder exploded");
        }
    }

    #[test]
    fn test_vertex_labels_offset() {
        let phonemes = seq("K AE1 T K AE1 T D AO1 G");
        let labels = vertex_labels(&phonemes, 7, 3).unwrap();
        assert_eq!(labels, seq("T K AE1 T D AO1 G"));
    }

    #[test]
    fn test_vertex_labels_mismatch() {
        let phonemes = seq("A B C");
        assert!(vertex_labels(&phonemes, 0, 3).unwrap().is_empty());
        assert!(matches!(
            vertex_labels(&phonemes, 2, 3),
            Err(SongError::LabelMismatch {
                vertices: 2,
                phonemes: 3,
                offset: 2
            })
        ));
    }

    #[test]
    fn test_process_song_done_then_skipped() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, Arc::new(MultiScaleBuilder::new()));
        let song = SongRecord::new("s1", "cat cat dog");

        let first = orch.process_song(&song);
        assert_eq!(first.final_state, JobState::Done);
        assert!(matches!(first.outcome, JobOutcome::Done { vertices: 7, .. }));

        let second = orch.process_song(&song);
        assert_eq!(second.outcome, JobOutcome::Skipped);
        assert_eq!(second.final_state, JobState::Skipped);
    }

    #[test]
    fn test_panic_is_contained() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, Arc::new(PanickingBuilder));

        let report = orch.process_song(&SongRecord::new("s1", "cat cat dog"));

        assert_eq!(report.final_state, JobState::Failed);
        match report.outcome {
            JobOutcome::Failed { reason } => assert!(reason.contains("builder exploded")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!dir.path().join("s1.xnet").exists());
    }

    #[test]
    fn test_invalid_song_id_fails_only_that_song() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, Arc::new(MultiScaleBuilder::new()));

        let report = orch.process_song(&SongRecord::new("../escape", "cat cat dog"));

        assert!(report.outcome.is_failure());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir, Arc::new(MultiScaleBuilder::new()));
        orch.cancel_flag().store(true, Ordering::SeqCst);

        let summary = orch
            .run(&[SongRecord::new("a", "cat"), SongRecord::new("b", "dog")])
            .unwrap();

        assert_eq!(summary.cancelled, 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_run_clears_partial_files_from_aborted_run() {
        // Given: a temp file left behind by a killed process
        let dir = TempDir::new().unwrap();
        let partial = dir.path().join(format!("{}x1y2z3", TEMP_PREFIX));
        std::fs::write(&partial, "#vertices 3").unwrap();
        let orch = orchestrator(&dir, Arc::new(MultiScaleBuilder::new()));

        // When: the next batch starts
        let summary = orch.run(&[SongRecord::new("s1", "cat cat dog")]).unwrap();

        // Then: the partial file is gone and only the artifact remains
        assert_eq!(summary.done, 1);
        assert!(!partial.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
