//! Candidate co-occurrence graph construction
//!
//! The pruning stage only relies on the builder contract: for a sequence of
//! `len` phonemes and window `w`, the graph has `len - (w - 1)` vertices
//! (none when the sequence is shorter than a window) and edges only between
//! vertices less than `w` apart. Any implementation honouring that can be
//! plugged into the orchestrator.

use crate::graph::{trimmed_vertex_count, vertex_position, Graph, GraphError};
use std::collections::BTreeMap;

/// Builds the candidate graph for one phoneme sequence
pub trait CandidateGraphBuilder: Send + Sync {
    fn build(&self, phonemes: &[String], window_size: usize) -> Result<Graph, GraphError>;
}

/// Multi-scale windowed co-occurrence graph
///
/// Every pair of vertices closer than the window is connected. The weight is
/// the mean, over radii `1..=w/2`, of the cosine similarity between the
/// phoneme-count vectors of the two radius-`r` windows centred on the
/// vertices' sequence positions. Windows are clipped at the sequence ends,
/// so weights are always in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiScaleBuilder;

/// Ordered so floating-point sums are reproducible run to run
type Counts<'a> = BTreeMap<&'a str, u32>;

impl MultiScaleBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Phoneme counts of the window `[center - radius, center + radius]`
    fn window_counts<'a>(phonemes: &'a [String], center: usize, radius: usize) -> Counts<'a> {
        let start = center.saturating_sub(radius);
        let end = (center + radius + 1).min(phonemes.len());
        let mut counts = Counts::new();
        for phoneme in &phonemes[start..end] {
            *counts.entry(phoneme.as_str()).or_insert(0) += 1;
        }
        counts
    }

    fn norm(counts: &Counts<'_>) -> f64 {
        counts
            .values()
            .map(|&v| (v as f64).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    fn cosine(a: &Counts<'_>, b: &Counts<'_>) -> f64 {
        let dot: f64 = a
            .iter()
            .filter_map(|(k, &va)| b.get(k).map(|&vb| va as f64 * vb as f64))
            .sum();
        let denom = Self::norm(a) * Self::norm(b);
        if denom == 0.0 {
            0.0
        } else {
            (dot / denom).clamp(0.0, 1.0)
        }
    }
}

impl CandidateGraphBuilder for MultiScaleBuilder {
    fn build(&self, phonemes: &[String], window_size: usize) -> Result<Graph, GraphError> {
        if window_size == 0 {
            return Err(GraphError::Construction(
                "window size must be positive".to_string(),
            ));
        }

        let vertex_count = trimmed_vertex_count(phonemes.len(), window_size);
        let mut graph = Graph::new(vertex_count);
        if vertex_count == 0 {
            return Ok(graph);
        }

        let max_radius = (window_size / 2).max(1);
        // windows[i][r - 1] = counts of radius r around vertex i
        let windows: Vec<Vec<Counts<'_>>> = (0..vertex_count)
            .map(|i| {
                let center = vertex_position(i, window_size).min(phonemes.len() - 1);
                (1..=max_radius)
                    .map(|r| Self::window_counts(phonemes, center, r))
                    .collect()
            })
            .collect();

        for i in 0..vertex_count {
            let reach = (i + window_size).min(vertex_count);
            for j in (i + 1)..reach {
                let weight = windows[i]
                    .iter()
                    .zip(&windows[j])
                    .map(|(a, b)| Self::cosine(a, b))
                    .sum::<f64>()
                    / max_radius as f64;
                graph.add_edge(i, j, weight)?;
            }
        }

        Ok(graph)
    }
}
