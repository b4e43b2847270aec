//! Batch run statistics

use crate::models::{JobOutcome, JobReport};
use serde::Serialize;
use std::time::Duration;

/// A song whose job failed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSong {
    pub song_id: String,
    pub reason: String,
}

/// Outcome counts for one batch run
///
/// Display: "N songs: D done, S skipped, F failed, C cancelled in Ts"
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Vertices written across all DONE songs
    pub vertices_written: usize,
    /// Edges written across all DONE songs
    pub edges_written: usize,
    pub failures: Vec<FailedSong>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn from_reports(reports: &[JobReport], elapsed: Duration) -> Self {
        let mut summary = Self {
            total: reports.len(),
            elapsed,
            ..Default::default()
        };

        for report in reports {
            match &report.outcome {
                JobOutcome::Skipped => summary.skipped += 1,
                JobOutcome::Done { vertices, edges } => {
                    summary.done += 1;
                    summary.vertices_written += vertices;
                    summary.edges_written += edges;
                }
                JobOutcome::Failed { reason } => {
                    summary.failed += 1;
                    summary.failures.push(FailedSong {
                        song_id: report.song_id.clone(),
                        reason: reason.clone(),
                    });
                }
                JobOutcome::Cancelled => summary.cancelled += 1,
            }
        }

        summary
    }

    /// True when every song has an artifact (written now or earlier)
    pub fn is_complete(&self) -> bool {
        self.done + self.skipped == self.total
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} songs: {} done, {} skipped, {} failed, {} cancelled in {:.1}s",
            self.total,
            self.done,
            self.skipped,
            self.failed,
            self.cancelled,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobState;

    fn report(id: &str, outcome: JobOutcome, final_state: JobState) -> JobReport {
        JobReport {
            song_id: id.to_string(),
            outcome,
            final_state,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_counts_by_outcome() {
        let reports = vec![
            report("a", JobOutcome::Done { vertices: 7, edges: 6 }, JobState::Done),
            report("b", JobOutcome::Done { vertices: 3, edges: 2 }, JobState::Done),
            report("c", JobOutcome::Skipped, JobState::Skipped),
            report(
                "d",
                JobOutcome::Failed {
                    reason: "boom".to_string(),
                },
                JobState::Failed,
            ),
            report("e", JobOutcome::Cancelled, JobState::Pending),
        ];

        let summary = BatchSummary::from_reports(&reports, Duration::from_millis(1500));

        assert_eq!(summary.total, 5);
        assert_eq!(summary.done, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.vertices_written, 10);
        assert_eq!(summary.edges_written, 8);
        assert_eq!(
            summary.failures,
            vec![FailedSong {
                song_id: "d".to_string(),
                reason: "boom".to_string()
            }]
        );
        assert!(!summary.is_complete());
        assert_eq!(
            summary.display_string(),
            "5 songs: 2 done, 1 skipped, 1 failed, 1 cancelled in 1.5s"
        );
    }

    #[test]
    fn test_empty_batch_is_complete() {
        let summary = BatchSummary::from_reports(&[], Duration::ZERO);
        assert!(summary.is_complete());
        assert_eq!(summary.total, 0);
    }
}
