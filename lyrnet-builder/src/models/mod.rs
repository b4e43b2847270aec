//! Data models for the network builder

pub mod song;
pub mod song_job;

pub use song::SongRecord;
pub use song_job::{JobOutcome, JobReport, JobState, SongJob, StateTransition};
