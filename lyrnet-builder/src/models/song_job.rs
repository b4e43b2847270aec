//! Per-song job state machine
//!
//! ```text
//! PENDING ──(artifact exists)──────────────▶ SKIPPED
//!    │
//!    └──▶ PROCESSING ──(artifact written)──▶ DONE
//!              ├──────(any stage fails)────▶ FAILED
//!              └──(written concurrently)───▶ SKIPPED
//! ```
//!
//! SKIPPED, DONE and FAILED are terminal. A FAILED song leaves no artifact,
//! so the next run picks it up again from PENDING.

use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Not yet examined
    Pending,
    /// Tokenizing, mapping, building, pruning or writing
    Processing,
    /// Artifact already present, nothing recomputed
    Skipped,
    /// Artifact written
    Done,
    /// A stage failed; no artifact written
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Skipped | JobState::Done | JobState::Failed)
    }

    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Skipped)
                | (JobState::Pending, JobState::Processing)
                | (JobState::Processing, JobState::Done)
                | (JobState::Processing, JobState::Skipped)
                | (JobState::Processing, JobState::Failed)
        )
    }
}

/// Recorded state change
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub old_state: JobState,
    pub new_state: JobState,
    pub transitioned_at: DateTime<Utc>,
}

/// In-memory job for one song
#[derive(Debug, Clone)]
pub struct SongJob {
    pub song_id: String,
    pub state: JobState,
    pub history: Vec<StateTransition>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SongJob {
    pub fn new(song_id: impl Into<String>) -> Self {
        Self {
            song_id: song_id.into(),
            state: JobState::Pending,
            history: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: JobState) -> StateTransition {
        debug_assert!(
            self.state.can_transition_to(new_state),
            "invalid transition {:?} -> {:?}",
            self.state,
            new_state
        );

        let transition = StateTransition {
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;
        if new_state.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }
        self.history.push(transition.clone());
        transition
    }
}

/// Final result of one song job
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Artifact already existed
    Skipped,
    /// Artifact written with this many vertices and edges
    Done { vertices: usize, edges: usize },
    /// Failed with the given reason
    Failed { reason: String },
    /// Never started because the batch was aborted
    Cancelled,
}

impl JobOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, JobOutcome::Failed { .. })
    }
}

/// Outcome plus bookkeeping, produced by every worker
#[derive(Debug, Clone)]
pub struct JobReport {
    pub song_id: String,
    pub outcome: JobOutcome,
    pub final_state: JobState,
    pub elapsed: Duration,
}
