//! Re-reads written artifacts and checks the pruning postconditions:
//! no edge with `1 < distance < window_size`, every backbone edge weighted
//! exactly 1.0, and at most `floor(n * k_expected / 2)` edges.

use crate::config::NetworkParams;
use crate::graph::Graph;
use crate::services::artifact_writer::{read_graph, ARTIFACT_EXTENSION};
use crate::services::edge_pruner::BACKBONE_WEIGHT;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Problems found in one artifact
#[derive(Debug, Clone)]
pub struct ArtifactViolation {
    pub path: PathBuf,
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub checked: usize,
    pub violations: Vec<ArtifactViolation>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} artifacts checked, {} with violations",
            self.checked,
            self.violations.len()
        )
    }
}

/// Postcondition violations of a pruned graph; empty when it is valid
pub fn check_pruned_graph(graph: &Graph, params: &NetworkParams) -> Vec<String> {
    let mut problems = Vec::new();

    for edge in graph.edges() {
        let distance = edge.distance();
        if distance == 1 {
            if edge.weight != BACKBONE_WEIGHT {
                problems.push(format!(
                    "backbone edge ({}, {}) has weight {}",
                    edge.source, edge.target, edge.weight
                ));
            }
        } else if distance < params.window_size() {
            problems.push(format!(
                "edge ({}, {}) inside window (distance {})",
                edge.source, edge.target, distance
            ));
        }
    }

    let budget = params.edge_budget(graph.vertex_count());
    if graph.edge_count() > budget {
        problems.push(format!(
            "{} edges exceed budget {}",
            graph.edge_count(),
            budget
        ));
    }

    problems
}

/// Check every artifact under `dir`
pub fn verify_directory(dir: &Path, params: &NetworkParams) -> VerificationReport {
    let paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Error walking {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION))
        .collect();

    tracing::info!(artifacts = paths.len(), dir = %dir.display(), "Verifying artifacts");

    let mut violations: Vec<ArtifactViolation> = paths
        .par_iter()
        .filter_map(|path| {
            let problems = match read_graph(path) {
                Ok(labeled) => check_pruned_graph(&labeled.graph, params),
                Err(e) => vec![e.to_string()],
            };
            if problems.is_empty() {
                None
            } else {
                Some(ArtifactViolation {
                    path: path.clone(),
                    problems,
                })
            }
        })
        .collect();
    violations.sort_by(|a, b| a.path.cmp(&b.path));

    for violation in &violations {
        tracing::warn!(
            path = %violation.path.display(),
            "Artifact violates pruning rules: {}",
            violation.problems.join("; ")
        );
    }

    VerificationReport {
        checked: paths.len(),
        violations,
    }
}
