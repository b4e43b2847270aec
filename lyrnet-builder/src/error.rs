//! Error types for lyrnet-builder
//!
//! Fatal errors (dataset, dictionary, configuration) abort the run before any
//! worker is dispatched. `SongError` is confined to a single song job and is
//! reported through `JobOutcome::Failed`.

use crate::graph::GraphError;
use crate::services::artifact_writer::ArtifactError;
use thiserror::Error;

/// Everything that can go wrong while processing one song
#[derive(Debug, Error)]
pub enum SongError {
    /// Candidate graph construction or edge validation failed
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// The candidate graph has more vertices than the phoneme sequence can label
    #[error("Cannot label {vertices} vertices from {phonemes} phonemes starting at offset {offset}")]
    LabelMismatch {
        vertices: usize,
        phonemes: usize,
        offset: usize,
    },

    /// Artifact path or write failure
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// A stage panicked; the panic was contained to this song
    #[error("Panic during processing: {0}")]
    Panic(String),
}
