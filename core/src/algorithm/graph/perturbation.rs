//! Single-edge graph perturbations for robustness testing
//!
//! A perturbation flips a fair coin between inserting a missing edge and
//! deleting an existing one, falling back to the other kind when the chosen
//! one has no candidates. The input graph is never touched; the caller owns
//! the returned copy. Randomness is injected so experiments are reproducible.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::traits::NodeId;
use crate::data_structures::graph::Graph;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PerturbationError {
    /// The graph has neither an edge to remove nor a pair to connect
    #[error("No perturbation possible: {node_count}-node graph has no edges and no non-edges")]
    NoPerturbationPossible { node_count: usize },
}

/// Kind of single-edge edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerturbationKind {
    Add,
    Remove,
}

/// The edit applied to produce a perturbed copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerturbationRecord {
    pub kind: PerturbationKind,
    /// Edited edge as `(u, v)` with `u < v`
    pub edge: (NodeId, NodeId),
}

/// Produces single-edge variants of graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct Perturber;

impl Perturber {
    pub fn new() -> Self {
        Self
    }

    /// Copy of `graph` with exactly one edge added or removed
    pub fn perturb<R>(
        &self,
        graph: &Graph,
        rng: &mut R,
    ) -> Result<(Graph, PerturbationRecord), PerturbationError>
    where
        R: Rng + ?Sized,
    {
        let preferred = if rng.gen_bool(0.5) {
            PerturbationKind::Add
        } else {
            PerturbationKind::Remove
        };

        let mut perturbed = graph.clone();
        let record = match preferred {
            PerturbationKind::Add => Self::add_random_edge(&mut perturbed, rng)
                .or_else(|| Self::remove_random_edge(&mut perturbed, rng)),
            PerturbationKind::Remove => Self::remove_random_edge(&mut perturbed, rng)
                .or_else(|| Self::add_random_edge(&mut perturbed, rng)),
        };

        record
            .map(|record| (perturbed, record))
            .ok_or(PerturbationError::NoPerturbationPossible {
                node_count: graph.node_count(),
            })
    }

    /// Pairs `u < v` that are not yet connected, in lexicographic order
    pub fn candidate_non_edges(graph: &Graph) -> Vec<(NodeId, NodeId)> {
        let nodes: Vec<NodeId> = graph.nodes().collect();
        nodes
            .iter()
            .enumerate()
            .flat_map(|(i, &u)| nodes[i + 1..].iter().map(move |&v| (u, v)))
            .filter(|&(u, v)| !graph.has_edge(u, v))
            .collect()
    }

    fn add_random_edge<R>(graph: &mut Graph, rng: &mut R) -> Option<PerturbationRecord>
    where
        R: Rng + ?Sized,
    {
        let &(u, v) = Self::candidate_non_edges(graph).choose(rng)?;
        graph.add_edge(u, v).ok()?;
        Some(PerturbationRecord {
            kind: PerturbationKind::Add,
            edge: (u, v),
        })
    }

    fn remove_random_edge<R>(graph: &mut Graph, rng: &mut R) -> Option<PerturbationRecord>
    where
        R: Rng + ?Sized,
    {
        let edges: Vec<(NodeId, NodeId)> = graph.edges().collect();
        let &(u, v) = edges.choose(rng)?;
        graph.remove_edge(u, v);
        Some(PerturbationRecord {
            kind: PerturbationKind::Remove,
            edge: (u, v),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_perturbation_changes_exactly_one_edge() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let graph = Graph::from_edges(0..5, [(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();

        for _ in 0..50 {
            let (perturbed, record) = Perturber::new().perturb(&graph, &mut rng).unwrap();
            let (u, v) = record.edge;
            assert!(u < v);
            match record.kind {
                PerturbationKind::Add => {
                    assert_eq!(perturbed.edge_count(), graph.edge_count() + 1);
                    assert!(!graph.has_edge(u, v));
                    assert!(perturbed.has_edge(u, v));
                }
                PerturbationKind::Remove => {
                    assert_eq!(perturbed.edge_count(), graph.edge_count() - 1);
                    assert!(graph.has_edge(u, v));
                    assert!(!perturbed.has_edge(u, v));
                }
            }
        }
        // Input untouched
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_both_kinds_occur() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let graph = Graph::from_edges(0..4, [(0, 1), (2, 3)]).unwrap();
        let kinds: Vec<PerturbationKind> = (0..64)
            .map(|_| Perturber::new().perturb(&graph, &mut rng).unwrap().1.kind)
            .collect();
        assert!(kinds.contains(&PerturbationKind::Add));
        assert!(kinds.contains(&PerturbationKind::Remove));
    }

    #[test]
    fn test_complete_graph_falls_back_to_remove() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let triangle = Graph::from_edges(0..3, [(0, 1), (1, 2), (2, 0)]).unwrap();
        for _ in 0..16 {
            let (_, record) = Perturber::new().perturb(&triangle, &mut rng).unwrap();
            assert_eq!(record.kind, PerturbationKind::Remove);
        }
    }

    #[test]
    fn test_edgeless_graph_falls_back_to_add() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let graph = Graph::with_nodes(0..3usize);
        for _ in 0..16 {
            let (perturbed, record) = Perturber::new().perturb(&graph, &mut rng).unwrap();
            assert_eq!(record.kind, PerturbationKind::Add);
            assert_eq!(perturbed.edge_count(), 1);
        }
    }

    #[test]
    fn test_no_perturbation_possible() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for graph in [Graph::new(), Graph::with_nodes([4usize])] {
            let node_count = graph.node_count();
            assert_eq!(
                Perturber::new().perturb(&graph, &mut rng),
                Err(PerturbationError::NoPerturbationPossible { node_count })
            );
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let graph = Graph::from_edges(0..6, [(0, 1), (1, 2), (3, 4)]).unwrap();
        let run = |seed| {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            (0..8)
                .map(|_| Perturber::new().perturb(&graph, &mut rng).unwrap().1)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn test_candidate_non_edges() {
        let graph = Graph::from_edges(0..3, [(0, 1)]).unwrap();
        assert_eq!(
            Perturber::candidate_non_edges(&graph),
            vec![(NodeId(0), NodeId(2)), (NodeId(1), NodeId(2))]
        );
    }
}
