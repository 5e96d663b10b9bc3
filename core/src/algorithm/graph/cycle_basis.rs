//! Minimum cycle basis of an undirected graph
//!
//! Cycle lengths are only an isomorphism invariant when the basis is
//! minimal: every minimum cycle basis has the same multiset of lengths,
//! while a fundamental basis depends on the spanning tree and so on node
//! labels. Construction follows Horton:
//!
//! 1. For every vertex `v` build a BFS tree; for every non-tree edge `(x, y)`
//!    whose tree paths to `v` meet only at `v`, the cycle
//!    `P(v, x) + (x, y) + P(y, v)` is a candidate.
//! 2. Sort candidates by length and greedily keep those linearly independent
//!    over GF(2) (edge-incidence vectors), until the basis has
//!    `m - n + c` cycles.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::data_structures::graph::Graph;

use super::invariants::InvariantError;

/// Edge-incidence vector over GF(2)
type EdgeSet = Vec<u64>;

struct Candidate {
    length: usize,
    edges: EdgeSet,
}

/// Lengths of the cycles of a minimum cycle basis, ascending
pub fn minimum_cycle_basis_lengths(graph: &Graph) -> Result<Vec<usize>, InvariantError> {
    let adjacency = graph.dense_adjacency();
    let vertex_count = adjacency.len();
    let edge_count = graph.edge_count();

    let dimension = cyclomatic_number(&adjacency, edge_count);
    if dimension == 0 {
        return Ok(Vec::new());
    }

    let edge_list: Vec<(usize, usize)> = adjacency
        .iter()
        .enumerate()
        .flat_map(|(u, neighbors)| neighbors.iter().filter(move |&&v| u < v).map(move |&v| (u, v)))
        .collect();
    let edge_index: HashMap<(usize, usize), usize> = edge_list
        .iter()
        .enumerate()
        .map(|(index, &edge)| (edge, index))
        .collect();
    let words = (edge_count + 63) / 64;

    let mut candidates = Vec::new();
    let mut seen: HashSet<EdgeSet> = HashSet::new();
    for root in 0..vertex_count {
        for candidate in horton_candidates(&adjacency, &edge_list, &edge_index, words, root) {
            if seen.insert(candidate.edges.clone()) {
                candidates.push(candidate);
            }
        }
    }
    candidates.sort_by_key(|candidate| candidate.length);

    // Rows are kept reduced against all earlier rows, keyed by their pivot bit
    let mut basis: Vec<(usize, EdgeSet)> = Vec::with_capacity(dimension);
    let mut lengths = Vec::with_capacity(dimension);
    for candidate in candidates {
        let mut reduced = candidate.edges.clone();
        for (pivot, row) in &basis {
            if bit(&reduced, *pivot) {
                xor_into(&mut reduced, row);
            }
        }
        if let Some(pivot) = lowest_bit(&reduced) {
            basis.push((pivot, reduced));
            lengths.push(candidate.length);
            if lengths.len() == dimension {
                break;
            }
        }
    }

    if lengths.len() != dimension {
        return Err(InvariantError::Degenerate {
            invariant: "cycle_basis",
            reason: format!("found {} independent cycles, expected {}", lengths.len(), dimension),
        });
    }
    lengths.sort_unstable();
    Ok(lengths)
}

/// `m - n + c`: the dimension of the cycle space
fn cyclomatic_number(adjacency: &[Vec<usize>], edge_count: usize) -> usize {
    let mut component = vec![false; adjacency.len()];
    let mut components = 0;
    for start in 0..adjacency.len() {
        if component[start] {
            continue;
        }
        components += 1;
        component[start] = true;
        let mut stack = vec![start];
        while let Some(vertex) = stack.pop() {
            for &neighbor in &adjacency[vertex] {
                if !component[neighbor] {
                    component[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }
    }
    (edge_count + components).saturating_sub(adjacency.len())
}

/// Horton candidate cycles rooted at `root`
fn horton_candidates(
    adjacency: &[Vec<usize>],
    edge_list: &[(usize, usize)],
    edge_index: &HashMap<(usize, usize), usize>,
    words: usize,
    root: usize,
) -> Vec<Candidate> {
    let vertex_count = adjacency.len();
    let mut parent: Vec<Option<usize>> = vec![None; vertex_count];
    let mut depth: Vec<Option<usize>> = vec![None; vertex_count];
    depth[root] = Some(0);

    let mut queue = VecDeque::from([root]);
    while let Some(vertex) = queue.pop_front() {
        let next_depth = depth[vertex].map_or(0, |d| d + 1);
        for &neighbor in &adjacency[vertex] {
            if depth[neighbor].is_none() {
                depth[neighbor] = Some(next_depth);
                parent[neighbor] = Some(vertex);
                queue.push_back(neighbor);
            }
        }
    }

    let path_to_root = |mut vertex: usize| {
        let mut path = vec![vertex];
        while let Some(up) = parent[vertex] {
            path.push(up);
            vertex = up;
        }
        path
    };

    let mut candidates = Vec::new();
    let mut on_path = vec![false; vertex_count];
    for (closing, &(x, y)) in edge_list.iter().enumerate() {
        let (Some(depth_x), Some(depth_y)) = (depth[x], depth[y]) else {
            continue;
        };
        if parent[x] == Some(y) || parent[y] == Some(x) {
            continue;
        }

        let path_x = path_to_root(x);
        let path_y = path_to_root(y);
        for &vertex in &path_x {
            on_path[vertex] = true;
        }
        let simple = path_y.iter().all(|&vertex| vertex == root || !on_path[vertex]);
        for &vertex in &path_x {
            on_path[vertex] = false;
        }
        if !simple {
            continue;
        }

        let mut edges = vec![0u64; words];
        for path in [&path_x, &path_y] {
            for step in path.windows(2) {
                let key = (step[0].min(step[1]), step[0].max(step[1]));
                if let Some(&index) = edge_index.get(&key) {
                    set_bit(&mut edges, index);
                }
            }
        }
        set_bit(&mut edges, closing);

        candidates.push(Candidate {
            length: depth_x + depth_y + 1,
            edges,
        });
    }
    candidates
}

#[inline]
fn bit(set: &[u64], index: usize) -> bool {
    set[index / 64] & (1u64 << (index % 64)) != 0
}

#[inline]
fn set_bit(set: &mut [u64], index: usize) {
    set[index / 64] |= 1u64 << (index % 64);
}

fn xor_into(target: &mut [u64], source: &[u64]) {
    for (t, s) in target.iter_mut().zip(source) {
        *t ^= s;
    }
}

fn lowest_bit(set: &[u64]) -> Option<usize> {
    set.iter()
        .enumerate()
        .find(|&(_, &word)| word != 0)
        .map(|(index, &word)| index * 64 + word.trailing_zeros() as usize)
}
