//! lyrnet-builder library interface
//!
//! Turns song lyrics into pruned phonetic co-occurrence networks, one
//! artifact file per song. Exposes the pipeline stages for integration
//! testing and for the `lyrnet-builder` binary.

pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod services;

pub use crate::config::{BuilderConfig, NetworkParams};
pub use crate::error::SongError;
pub use crate::graph::{Edge, Graph, GraphError};
pub use crate::models::{JobOutcome, JobState, SongRecord};
pub use crate::services::batch_orchestrator::{BatchOrchestrator, BatchSummary};
