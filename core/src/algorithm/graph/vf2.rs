//! Exact isomorphism search
//!
//! [`ExactMatcher`] is the seam between the verifier and the exponential
//! fallback search, so the search can be replaced (or instrumented in tests)
//! without touching verification. [`Vf2Matcher`] is a VF2-style state-space
//! search:
//!
//! - the next node of `G1` is taken from the terminal set first (unmapped
//!   neighbors of mapped nodes), then by highest degree;
//! - it may only pair with an unmapped node of `G2` of equal degree;
//! - a pair is feasible when it is adjacency-consistent with the partial
//!   mapping in both directions and has as many terminal neighbors on each
//!   side.
//!
//! Worst-case runtime is exponential in the node count; an optional state
//! budget turns runaway searches into [`MatchError::BudgetExceeded`].

use std::collections::BTreeMap;

use log::debug;
use thiserror::Error;

use crate::algorithm::traits::NodeId;
use crate::data_structures::graph::Graph;

/// Bijection from the nodes of `G1` to the nodes of `G2`
pub type NodeMapping = BTreeMap<NodeId, NodeId>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The search could not reach a trustworthy answer
    #[error("Exact match inconclusive: {0}")]
    Inconclusive(String),

    #[error("Search budget exceeded after exploring {explored} states")]
    BudgetExceeded { explored: usize },
}

/// Exact graph isomorphism search
pub trait ExactMatcher: Send + Sync {
    /// An adjacency-preserving bijection from `g1` onto `g2`, `None` when
    /// the search proves there is none
    fn find_isomorphism(&self, g1: &Graph, g2: &Graph) -> Result<Option<NodeMapping>, MatchError>;
}

/// VF2-style backtracking matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vf2Matcher {
    max_states: Option<usize>,
}

impl Vf2Matcher {
    pub fn new(max_states: Option<usize>) -> Self {
        Self { max_states }
    }

    pub fn unbounded() -> Self {
        Self { max_states: None }
    }

    pub fn max_states(&self) -> Option<usize> {
        self.max_states
    }

    pub fn set_max_states(&mut self, max_states: Option<usize>) {
        self.max_states = max_states;
    }
}

impl Default for Vf2Matcher {
    fn default() -> Self {
        Self::new(Some(1_000_000))
    }
}

/// Dense view of one side of the match
struct Side {
    ids: Vec<NodeId>,
    adjacency: Vec<Vec<usize>>,
    matrix: Vec<bool>,
}

impl Side {
    fn new(graph: &Graph) -> Self {
        let adjacency = graph.dense_adjacency();
        let order = adjacency.len();
        let mut matrix = vec![false; order * order];
        for (u, neighbors) in adjacency.iter().enumerate() {
            for &v in neighbors {
                matrix[u * order + v] = true;
            }
        }
        Self {
            ids: graph.nodes().collect(),
            adjacency,
            matrix,
        }
    }

    fn order(&self) -> usize {
        self.ids.len()
    }

    fn has_edge(&self, u: usize, v: usize) -> bool {
        self.matrix[u * self.order() + v]
    }

    fn degree(&self, u: usize) -> usize {
        self.adjacency[u].len()
    }
}

/// Partial mapping and terminal sets at one point of the search
#[derive(Clone)]
struct State {
    core_1: Vec<Option<usize>>,
    core_2: Vec<Option<usize>>,
    terminal_1: Vec<bool>,
    terminal_2: Vec<bool>,
    depth: usize,
}

impl State {
    fn empty(order: usize) -> Self {
        Self {
            core_1: vec![None; order],
            core_2: vec![None; order],
            terminal_1: vec![false; order],
            terminal_2: vec![false; order],
            depth: 0,
        }
    }

    fn extend(&self, g1: &Side, g2: &Side, node_1: usize, node_2: usize) -> Self {
        let mut next = self.clone();
        next.core_1[node_1] = Some(node_2);
        next.core_2[node_2] = Some(node_1);
        next.terminal_1[node_1] = false;
        next.terminal_2[node_2] = false;
        for &neighbor in &g1.adjacency[node_1] {
            if next.core_1[neighbor].is_none() {
                next.terminal_1[neighbor] = true;
            }
        }
        for &neighbor in &g2.adjacency[node_2] {
            if next.core_2[neighbor].is_none() {
                next.terminal_2[neighbor] = true;
            }
        }
        next.depth += 1;
        next
    }
}

impl ExactMatcher for Vf2Matcher {
    fn find_isomorphism(&self, g1: &Graph, g2: &Graph) -> Result<Option<NodeMapping>, MatchError> {
        if g1.node_count() != g2.node_count() || g1.edge_count() != g2.edge_count() {
            return Ok(None);
        }

        let side_1 = Side::new(g1);
        let side_2 = Side::new(g2);
        let order = side_1.order();

        let mut explored = 0;
        let mut stack = vec![State::empty(order)];

        while let Some(state) = stack.pop() {
            explored += 1;
            if self.max_states.is_some_and(|limit| explored > limit) {
                return Err(MatchError::BudgetExceeded { explored: explored - 1 });
            }

            if state.depth == order {
                debug!("VF2 found a mapping after exploring {} states", explored);
                return complete_mapping(&side_1, &side_2, &state).map(Some);
            }

            let Some(node_1) = next_node(&side_1, &state) else {
                continue;
            };

            // Pushed in reverse so lower-indexed candidates are tried first
            for node_2 in (0..order).rev() {
                if state.core_2[node_2].is_none()
                    && side_1.degree(node_1) == side_2.degree(node_2)
                    && is_feasible(&side_1, &side_2, &state, node_1, node_2)
                {
                    stack.push(state.extend(&side_1, &side_2, node_1, node_2));
                }
            }
        }

        debug!("VF2 exhausted {} states without a mapping", explored);
        Ok(None)
    }
}

/// Unmapped node of `G1` to extend next: terminal first, then highest degree
fn next_node(g1: &Side, state: &State) -> Option<usize> {
    (0..g1.order())
        .filter(|&node| state.core_1[node].is_none())
        .min_by_key(|&node| (!state.terminal_1[node], std::cmp::Reverse(g1.degree(node))))
}

fn is_feasible(g1: &Side, g2: &Side, state: &State, node_1: usize, node_2: usize) -> bool {
    // Edges to mapped nodes must correspond in both directions
    let forward = g1.adjacency[node_1]
        .iter()
        .filter_map(|&neighbor| state.core_1[neighbor])
        .all(|image| g2.has_edge(node_2, image));
    if !forward {
        return false;
    }
    let backward = g2.adjacency[node_2]
        .iter()
        .filter_map(|&neighbor| state.core_2[neighbor])
        .all(|preimage| g1.has_edge(node_1, preimage));
    if !backward {
        return false;
    }

    let terminal_1 = g1.adjacency[node_1]
        .iter()
        .filter(|&&neighbor| state.terminal_1[neighbor])
        .count();
    let terminal_2 = g2.adjacency[node_2]
        .iter()
        .filter(|&&neighbor| state.terminal_2[neighbor])
        .count();
    terminal_1 == terminal_2
}

/// Translate a full state into node ids, checking every edge survives
fn complete_mapping(g1: &Side, g2: &Side, state: &State) -> Result<NodeMapping, MatchError> {
    let mut mapping = NodeMapping::new();
    for (node_1, image) in state.core_1.iter().enumerate() {
        let node_2 = image.ok_or_else(|| {
            MatchError::Inconclusive(format!(
                "node {} left unmapped in a complete state",
                g1.ids[node_1]
            ))
        })?;
        mapping.insert(g1.ids[node_1], g2.ids[node_2]);
    }

    for (u, neighbors) in g1.adjacency.iter().enumerate() {
        for &v in neighbors {
            let (Some(image_u), Some(image_v)) = (state.core_1[u], state.core_1[v]) else {
                continue;
            };
            if !g2.has_edge(image_u, image_v) {
                return Err(MatchError::Inconclusive(format!(
                    "edge ({}, {}) is not preserved by the found mapping",
                    g1.ids[u], g1.ids[v]
                )));
            }
        }
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(mapping: &NodeMapping, graph: &Graph) -> Graph {
        graph.relabel(mapping).unwrap()
    }

    #[test]
    fn test_finds_rotation_of_square() {
        let square = Graph::from_edges(0..4, [(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        let rotated = Graph::from_edges(0..4, [(1, 2), (2, 3), (3, 0), (0, 1)]).unwrap();

        let mapping = Vf2Matcher::default().find_isomorphism(&square, &rotated).unwrap().unwrap();
        assert_eq!(mapping.len(), 4);
        assert_eq!(apply(&mapping, &square), rotated);
    }

    #[test]
    fn test_mapping_reproduces_target_edges() {
        let g1 = Graph::from_edges(0..6, [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5)]).unwrap();
        let g2 = Graph::from_edges(
            [10, 11, 12, 13, 14, 15],
            [(15, 14), (14, 13), (13, 12), (12, 11), (11, 10), (10, 12)],
        )
        .unwrap();

        let mapping = Vf2Matcher::unbounded().find_isomorphism(&g1, &g2).unwrap().unwrap();
        let mapped: Vec<_> = apply(&mapping, &g1).edges().collect();
        let target: Vec<_> = g2.edges().collect();
        assert_eq!(mapped, target);
    }

    #[test]
    fn test_proves_non_isomorphism() {
        let hexagon =
            Graph::from_edges(0..6, [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]).unwrap();
        let triangles =
            Graph::from_edges(0..6, [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]).unwrap();
        assert_eq!(Vf2Matcher::default().find_isomorphism(&hexagon, &triangles), Ok(None));
    }

    #[test]
    fn test_size_mismatch_has_no_mapping() {
        let path = Graph::from_edges(0..3, [(0, 1), (1, 2)]).unwrap();
        let edge = Graph::from_edges(0..2, [(0, 1)]).unwrap();
        assert_eq!(Vf2Matcher::default().find_isomorphism(&path, &edge), Ok(None));
    }

    #[test]
    fn test_empty_graphs_match_trivially() {
        let mapping = Vf2Matcher::default()
            .find_isomorphism(&Graph::new(), &Graph::new())
            .unwrap()
            .unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_edgeless_graphs_match() {
        let g1 = Graph::with_nodes(0..5usize);
        let g2 = Graph::with_nodes(5..10usize);
        let mapping = Vf2Matcher::default().find_isomorphism(&g1, &g2).unwrap().unwrap();
        assert_eq!(apply(&mapping, &g1), g2);
    }

    #[test]
    fn test_budget_exceeded() {
        // Two non-isomorphic 3-regular graphs on 6 nodes force a full search
        let prism = Graph::from_edges(
            0..6,
            [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (0, 3), (1, 4), (2, 5)],
        )
        .unwrap();
        let k33 = Graph::from_edges(
            0..6,
            [(0, 3), (0, 4), (0, 5), (1, 3), (1, 4), (1, 5), (2, 3), (2, 4), (2, 5)],
        )
        .unwrap();

        assert_eq!(
            Vf2Matcher::new(Some(2)).find_isomorphism(&prism, &k33),
            Err(MatchError::BudgetExceeded { explored: 2 })
        );
        assert_eq!(Vf2Matcher::unbounded().find_isomorphism(&prism, &k33), Ok(None));
    }
}
