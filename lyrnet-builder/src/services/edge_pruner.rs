//! Edge pruning
//!
//! Two filters, applied in order:
//!
//! 1. Window rule: distance-1 edges are kept with weight forced to exactly
//!    1.0; edges with `1 < distance < window_size` are removed; edges at or
//!    beyond the window are left as they are.
//! 2. Degree budget: only the `floor(n * k_expected / 2)` heaviest edges
//!    survive. Ranking is a stable sort on weight (descending) over the
//!    current edge order, so equal weights keep construction order. Survivors
//!    keep their relative order. Backbone edges get no special protection.

use crate::config::NetworkParams;
use crate::graph::Graph;

/// Weight assigned to every backbone (distance 1) edge
pub const BACKBONE_WEIGHT: f64 = 1.0;

/// Edge counts through both filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub vertex_count: usize,
    pub candidate_edges: usize,
    pub removed_by_window: usize,
    pub budget: usize,
    pub removed_by_budget: usize,
    pub remaining_edges: usize,
}

/// Window rule; returns the number of edges removed
pub fn apply_window_filter(graph: &mut Graph, window_size: usize) -> usize {
    let edges = graph.edges_mut();
    let before = edges.len();

    edges.retain_mut(|edge| match edge.distance() {
        1 => {
            edge.weight = BACKBONE_WEIGHT;
            true
        }
        d if d < window_size => false,
        _ => true,
    });

    before - edges.len()
}

/// Degree budget rule; returns the number of edges removed
pub fn apply_degree_budget(graph: &mut Graph, k_expected: usize) -> usize {
    let budget = graph.vertex_count().saturating_mul(k_expected) / 2;
    retain_heaviest(graph, budget)
}

fn retain_heaviest(graph: &mut Graph, budget: usize) -> usize {
    let edges = graph.edges_mut();
    let before = edges.len();
    if before <= budget {
        return 0;
    }

    let mut ranking: Vec<usize> = (0..before).collect();
    // sort_by is stable: equal weights stay in edge order
    ranking.sort_by(|&a, &b| edges[b].weight.total_cmp(&edges[a].weight));

    let mut keep = vec![false; before];
    for &idx in &ranking[..budget] {
        keep[idx] = true;
    }

    let mut idx = 0;
    edges.retain(|_| {
        let kept = keep[idx];
        idx += 1;
        kept
    });

    before - edges.len()
}

/// Run both filters with the given parameters
pub fn prune(graph: &mut Graph, params: &NetworkParams) -> PruneReport {
    let candidate_edges = graph.edge_count();
    let removed_by_window = apply_window_filter(graph, params.window_size());
    let budget = params.edge_budget(graph.vertex_count());
    let removed_by_budget = retain_heaviest(graph, budget);

    let report = PruneReport {
        vertex_count: graph.vertex_count(),
        candidate_edges,
        removed_by_window,
        budget,
        removed_by_budget,
        remaining_edges: graph.edge_count(),
    };

    tracing::trace!(?report, "Pruned candidate graph");
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(vertex_count: usize, edges: &[(usize, usize, f64)]) -> Graph {
        let mut g = Graph::new(vertex_count);
        for &(a, b, w) in edges {
            g.add_edge(a, b, w).unwrap();
        }
        g
    }

    fn pairs(g: &Graph) -> Vec<(usize, usize)> {
        g.edges().iter().map(|e| (e.source, e.target)).collect()
    }

    #[test]
    fn test_window_filter_cases() {
        let mut g = graph(
            20,
            &[(0, 1, 0.3), (0, 2, 0.9), (0, 4, 0.9), (0, 5, 0.7), (3, 12, 0.2)],
        );

        let removed = apply_window_filter(&mut g, 5);

        assert_eq!(removed, 2);
        assert_eq!(pairs(&g), vec![(0, 1), (0, 5), (3, 12)]);
        assert_eq!(g.edges()[0].weight, 1.0);
        // at/beyond the window: untouched
        assert_eq!(g.edges()[1].weight, 0.7);
        assert_eq!(g.edges()[2].weight, 0.2);
    }

    #[test]
    fn test_budget_keeps_heaviest() {
        let mut g = graph(4, &[(0, 1, 0.1), (1, 2, 0.9), (2, 3, 0.5), (0, 3, 0.7)]);

        // budget = 4 * 1 / 2 = 2
        let removed = apply_degree_budget(&mut g, 1);

        assert_eq!(removed, 2);
        assert_eq!(pairs(&g), vec![(1, 2), (0, 3)]);
    }

    #[test]
    fn test_budget_ties_keep_edge_order() {
        let mut g = graph(5, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)]);

        // budget = 5 * 1 / 2 = 2
        apply_degree_budget(&mut g, 1);

        assert_eq!(pairs(&g), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_budget_can_drop_backbone() {
        // heavy long-range edge outranks unit-weight backbone
        let mut g = graph(4, &[(0, 1, 0.5), (1, 2, 0.5), (2, 3, 0.5), (0, 3, 2.0)]);
        let params = NetworkParams::new(3, 1).unwrap();

        let report = prune(&mut g, &params);

        assert_eq!(report.budget, 2);
        assert_eq!(report.removed_by_window, 0);
        assert_eq!(report.removed_by_budget, 2);
        assert_eq!(pairs(&g), vec![(0, 1), (0, 3)]);
    }

    #[test]
    fn test_prune_report() {
        let mut g = graph(
            6,
            &[(0, 1, 0.2), (0, 2, 0.4), (1, 2, 0.2), (1, 3, 0.4), (2, 3, 0.2)],
        );
        let params = NetworkParams::new(3, 20).unwrap();

        let report = prune(&mut g, &params);

        assert_eq!(
            report,
            PruneReport {
                vertex_count: 6,
                candidate_edges: 5,
                removed_by_window: 2,
                budget: 60,
                removed_by_budget: 0,
                remaining_edges: 3,
            }
        );
        assert!(g.edges().iter().all(|e| e.weight == BACKBONE_WEIGHT));
    }

    #[test]
    fn test_empty_graph() {
        let mut g = Graph::new(0);
        let report = prune(&mut g, &NetworkParams::default());
        assert_eq!(report.budget, 0);
        assert_eq!(report.remaining_edges, 0);
    }
}
