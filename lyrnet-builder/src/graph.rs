//! Undirected weighted graph over phoneme-occurrence vertices
//!
//! Vertices are the indices `0..vertex_count`. Vertex `i` stands for the
//! phoneme at sequence position [`vertex_position`]`(i, window_size)`; the
//! first and last `window_size / 2` positions have no full window and get no
//! vertex. Edges are kept in insertion order, which is the tie-break order
//! used when pruning.

use thiserror::Error;

/// Graph construction errors
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Self loop on vertex {0}")]
    SelfLoop(usize),

    #[error("Vertex {vertex} out of range (vertex count {vertex_count})")]
    VertexOutOfRange { vertex: usize, vertex_count: usize },

    #[error("Edge ({from}, {to}) has non-finite weight {weight}")]
    InvalidWeight { from: usize, to: usize, weight: f64 },

    #[error("Graph construction failed: {0}")]
    Construction(String),
}

/// Undirected edge, stored with `source < target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

impl Edge {
    /// Index distance between the endpoints
    pub fn distance(&self) -> usize {
        self.target - self.source
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    vertex_count: usize,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            edges: Vec::new(),
        }
    }

    /// Add an undirected edge; endpoint order does not matter
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) -> Result<(), GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        for vertex in [a, b] {
            if vertex >= self.vertex_count {
                return Err(GraphError::VertexOutOfRange {
                    vertex,
                    vertex_count: self.vertex_count,
                });
            }
        }
        let (source, target) = if a < b { (a, b) } else { (b, a) };
        if !weight.is_finite() {
            return Err(GraphError::InvalidWeight {
                from: source,
                to: target,
                weight,
            });
        }
        self.edges.push(Edge {
            source,
            target,
            weight,
        });
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn edges_mut(&mut self) -> &mut Vec<Edge> {
        &mut self.edges
    }

    pub fn degree(&self, vertex: usize) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == vertex || e.target == vertex)
            .count()
    }

    pub fn average_degree(&self) -> f64 {
        if self.vertex_count == 0 {
            0.0
        } else {
            2.0 * self.edges.len() as f64 / self.vertex_count as f64
        }
    }
}

/// Sequence position of vertex `index`; labels and window centres both use it
pub fn vertex_position(index: usize, window_size: usize) -> usize {
    index + window_size / 2 + 1
}

/// Vertex count for a sequence of `sequence_len` phonemes
pub fn trimmed_vertex_count(sequence_len: usize, window_size: usize) -> usize {
    sequence_len.saturating_sub(window_size.saturating_sub(1))
}
