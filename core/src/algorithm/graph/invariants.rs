//! Secondary structural invariants used to disprove isomorphism cheaply
//!
//! An [`InvariantProfile`] bundles properties preserved under relabeling.
//! Any field that differs between two graphs is a proof of non-isomorphism;
//! [`InvariantDiff`] records which fields differ and by how much.
//!
//! # Degenerate inputs
//!
//! The cycle basis and the adjacency spectrum are the only fields that can
//! fail to compute. Failure is logged, the field is recorded as empty and
//! listed in [`InvariantProfile::degenerate_fields`], so a single degenerate
//! graph never aborts an analysis. A degenerate field is never compared.

use std::collections::{BTreeMap, BTreeSet};

use approx::relative_eq;
use log::warn;
use nalgebra::{DMatrix, SymmetricEigen};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::graph::cycle_basis::minimum_cycle_basis_lengths;
use crate::config::VerifierConfig;
use crate::data_structures::graph::Graph;

/// Number of eigenvalues reported per side of a spectral difference
const REPORTED_EIGENVALUES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    /// A sub-invariant could not be computed for this graph
    #[error("Degenerate input for {invariant}: {reason}")]
    Degenerate { invariant: &'static str, reason: String },
}

/// Isomorphism-invariant summary of one graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantProfile {
    pub node_count: usize,
    pub edge_count: usize,
    /// Node degrees, ascending
    pub degree_sequence: Vec<usize>,
    /// Lengths of the cycles of a minimum cycle basis, ascending
    pub cycle_lengths: Vec<usize>,
    pub cycle_count: usize,
    /// Triangles, each counted once
    pub triangle_count: usize,
    /// Per node, the ascending degrees of nodes exactly two hops away;
    /// the outer list is sorted and omits nodes with no such neighbors
    pub two_hop_distribution: Vec<Vec<usize>>,
    /// Adjacency eigenvalues, ascending
    pub eigenvalues: Vec<f64>,
    /// Fields that failed to compute and hold a placeholder
    #[serde(default)]
    pub degenerate_fields: BTreeSet<InvariantField>,
}

impl InvariantProfile {
    pub fn is_degenerate(&self, field: InvariantField) -> bool {
        self.degenerate_fields.contains(&field)
    }
}

/// Computes [`InvariantProfile`]s
#[derive(Debug, Clone)]
pub struct InvariantProfiler {
    eigen_epsilon: f64,
    eigen_max_iterations: usize,
}

impl InvariantProfiler {
    pub fn new(config: &VerifierConfig) -> Self {
        Self {
            eigen_epsilon: config.eigen_epsilon,
            eigen_max_iterations: config.eigen_max_iterations,
        }
    }

    pub fn profile(&self, graph: &Graph) -> InvariantProfile {
        let adjacency = graph.dense_adjacency();

        let mut degree_sequence: Vec<usize> = adjacency.iter().map(Vec::len).collect();
        degree_sequence.sort_unstable();

        let mut degenerate_fields = BTreeSet::new();

        let cycle_lengths = minimum_cycle_basis_lengths(graph).unwrap_or_else(|error| {
            warn!("{}; recording an empty cycle basis", error);
            degenerate_fields.extend([InvariantField::CycleLengths, InvariantField::CycleCount]);
            Vec::new()
        });

        let eigenvalues = self.eigenvalues(&adjacency).unwrap_or_else(|error| {
            warn!("{}; recording an empty spectrum", error);
            degenerate_fields.insert(InvariantField::Eigenvalues);
            Vec::new()
        });

        InvariantProfile {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            degree_sequence,
            cycle_count: cycle_lengths.len(),
            cycle_lengths,
            triangle_count: count_triangles(&adjacency),
            two_hop_distribution: two_hop_distribution(&adjacency),
            eigenvalues,
            degenerate_fields,
        }
    }

    /// Ascending eigenvalues of the symmetric adjacency matrix
    fn eigenvalues(&self, adjacency: &[Vec<usize>]) -> Result<Vec<f64>, InvariantError> {
        let order = adjacency.len();
        if order == 0 {
            return Ok(Vec::new());
        }

        let mut matrix = DMatrix::<f64>::zeros(order, order);
        for (row, neighbors) in adjacency.iter().enumerate() {
            for &column in neighbors {
                matrix[(row, column)] = 1.0;
            }
        }

        let decomposition =
            SymmetricEigen::try_new(matrix, self.eigen_epsilon, self.eigen_max_iterations)
                .ok_or_else(|| InvariantError::Degenerate {
                    invariant: "eigenvalues",
                    reason: format!(
                        "symmetric eigensolver did not converge within {} iterations",
                        self.eigen_max_iterations
                    ),
                })?;

        let mut eigenvalues: Vec<f64> = decomposition.eigenvalues.iter().copied().collect();
        if eigenvalues.iter().any(|value| !value.is_finite()) {
            return Err(InvariantError::Degenerate {
                invariant: "eigenvalues",
                reason: "non-finite eigenvalue".to_string(),
            });
        }
        eigenvalues.sort_by(f64::total_cmp);
        Ok(eigenvalues)
    }
}

impl Default for InvariantProfiler {
    fn default() -> Self {
        Self::new(&VerifierConfig::default())
    }
}

/// Each triangle `u < v < w` is counted from its lowest edge
fn count_triangles(adjacency: &[Vec<usize>]) -> usize {
    let mut triangles = 0;
    for (u, neighbors) in adjacency.iter().enumerate() {
        for &v in neighbors.iter().filter(|&&v| v > u) {
            triangles += neighbors
                .iter()
                .filter(|&&w| w > v && adjacency[v].binary_search(&w).is_ok())
                .count();
        }
    }
    triangles
}

fn two_hop_distribution(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut marker = vec![usize::MAX; adjacency.len()];
    let mut distribution = Vec::new();

    for (node, neighbors) in adjacency.iter().enumerate() {
        marker[node] = node;
        for &neighbor in neighbors {
            marker[neighbor] = node;
        }

        let mut degrees = Vec::new();
        for &neighbor in neighbors {
            for &second in &adjacency[neighbor] {
                if marker[second] != node {
                    marker[second] = node;
                    degrees.push(adjacency[second].len());
                }
            }
        }

        if !degrees.is_empty() {
            degrees.sort_unstable();
            distribution.push(degrees);
        }
    }

    distribution.sort();
    distribution
}

/// A field of [`InvariantProfile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantField {
    NodeCount,
    EdgeCount,
    DegreeSequence,
    CycleLengths,
    CycleCount,
    TriangleCount,
    TwoHopDistribution,
    Eigenvalues,
}

/// How one invariant differs between two graphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDifference {
    Counts { left: usize, right: usize },
    Sequences { left: Vec<usize>, right: Vec<usize> },
    /// Leading eigenvalues of each side only
    Spectra { left: Vec<f64>, right: Vec<f64> },
    /// Difference too large to display usefully
    Structural { note: String },
}

/// Fields on which two invariant profiles disagree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvariantDiff {
    differences: BTreeMap<InvariantField, FieldDifference>,
}

impl InvariantDiff {
    /// Compare two profiles field by field
    ///
    /// Eigenvalues are compared elementwise with `approx::relative_eq` using
    /// `tolerance` as both the absolute and relative bound. Fields that are
    /// degenerate on either side are skipped.
    pub fn between(left: &InvariantProfile, right: &InvariantProfile, tolerance: f64) -> Self {
        let mut differences = BTreeMap::new();
        let comparable =
            |field: InvariantField| !left.is_degenerate(field) && !right.is_degenerate(field);

        let counts = [
            (InvariantField::NodeCount, left.node_count, right.node_count),
            (InvariantField::EdgeCount, left.edge_count, right.edge_count),
            (InvariantField::CycleCount, left.cycle_count, right.cycle_count),
            (InvariantField::TriangleCount, left.triangle_count, right.triangle_count),
        ];
        for (field, l, r) in counts {
            if l != r && comparable(field) {
                differences.insert(field, FieldDifference::Counts { left: l, right: r });
            }
        }

        let sequences = [
            (InvariantField::DegreeSequence, &left.degree_sequence, &right.degree_sequence),
            (InvariantField::CycleLengths, &left.cycle_lengths, &right.cycle_lengths),
        ];
        for (field, l, r) in sequences {
            if l != r && comparable(field) {
                differences.insert(
                    field,
                    FieldDifference::Sequences {
                        left: l.clone(),
                        right: r.clone(),
                    },
                );
            }
        }

        if left.two_hop_distribution != right.two_hop_distribution {
            differences.insert(
                InvariantField::TwoHopDistribution,
                FieldDifference::Structural {
                    note: "2-hop neighbor degree distributions differ".to_string(),
                },
            );
        }

        if comparable(InvariantField::Eigenvalues)
            && !spectra_match(&left.eigenvalues, &right.eigenvalues, tolerance)
        {
            differences.insert(
                InvariantField::Eigenvalues,
                FieldDifference::Spectra {
                    left: left.eigenvalues.iter().take(REPORTED_EIGENVALUES).copied().collect(),
                    right: right.eigenvalues.iter().take(REPORTED_EIGENVALUES).copied().collect(),
                },
            );
        }

        Self { differences }
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn get(&self, field: InvariantField) -> Option<&FieldDifference> {
        self.differences.get(&field)
    }

    pub fn contains(&self, field: InvariantField) -> bool {
        self.differences.contains_key(&field)
    }

    /// Differing fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = InvariantField> + '_ {
        self.differences.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InvariantField, &FieldDifference)> {
        self.differences.iter().map(|(&field, difference)| (field, difference))
    }
}

fn spectra_match(left: &[f64], right: &[f64], tolerance: f64) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(&l, &r)| relative_eq!(l, r, epsilon = tolerance, max_relative = tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::traits::NodeId;
    use approx::assert_relative_eq;

    fn path4() -> Graph {
        Graph::from_edges(0..4, [(0, 1), (1, 2), (2, 3)]).unwrap()
    }

    fn star4() -> Graph {
        Graph::from_edges(0..4, [(0, 1), (0, 2), (0, 3)]).unwrap()
    }

    fn hexagon() -> Graph {
        Graph::from_edges(0..6, [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]).unwrap()
    }

    fn two_triangles() -> Graph {
        Graph::from_edges(0..6, [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]).unwrap()
    }

    #[test]
    fn test_path_profile() {
        let profile = InvariantProfiler::default().profile(&path4());
        assert_eq!(profile.node_count, 4);
        assert_eq!(profile.edge_count, 3);
        assert_eq!(profile.degree_sequence, vec![1, 1, 2, 2]);
        assert!(profile.cycle_lengths.is_empty());
        assert_eq!(profile.cycle_count, 0);
        assert_eq!(profile.triangle_count, 0);
        // Ends see the far inner node (degree 2), inner nodes see the far end (degree 1)
        assert_eq!(profile.two_hop_distribution, vec![vec![1], vec![1], vec![2], vec![2]]);

        // Spectrum of P4: +-2cos(pi/5), +-2cos(2pi/5)
        let golden = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let expected = [-golden, -1.0 / golden, 1.0 / golden, golden];
        assert_eq!(profile.eigenvalues.len(), 4);
        for (value, expected) in profile.eigenvalues.iter().zip(expected) {
            assert_relative_eq!(*value, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_triangles_counted_once() {
        let k4 = Graph::from_edges(0..4, [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]).unwrap();
        let profile = InvariantProfiler::default().profile(&k4);
        assert_eq!(profile.triangle_count, 4);
        assert_eq!(profile.cycle_lengths, vec![3, 3, 3]);
        assert!(profile.two_hop_distribution.is_empty());
    }

    #[test]
    fn test_empty_graph_profile() {
        let profile = InvariantProfiler::default().profile(&Graph::new());
        assert_eq!(profile.node_count, 0);
        assert!(profile.degree_sequence.is_empty());
        assert!(profile.eigenvalues.is_empty());
    }

    #[test]
    fn test_profile_is_label_invariant() {
        let profiler = InvariantProfiler::default();
        let edges = [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5)];
        let graph = Graph::from_edges(0..6, edges).unwrap();
        let mapping: BTreeMap<NodeId, NodeId> = (0..6usize)
            .map(|i| (NodeId(i), NodeId((i * 5 + 1) % 6)))
            .collect();
        let relabeled = graph.relabel(&mapping).unwrap();

        let diff = InvariantDiff::between(
            &profiler.profile(&graph),
            &profiler.profile(&relabeled),
            1e-9,
        );
        assert!(diff.is_empty(), "unexpected differences: {:?}", diff);
    }

    #[test]
    fn test_path_and_star_differ_in_degree_sequence() {
        let profiler = InvariantProfiler::default();
        let (path, star) = (profiler.profile(&path4()), profiler.profile(&star4()));
        let diff = InvariantDiff::between(&path, &star, 1e-9);

        assert_eq!(
            diff.get(InvariantField::DegreeSequence),
            Some(&FieldDifference::Sequences {
                left: vec![1, 1, 2, 2],
                right: vec![1, 1, 1, 3],
            })
        );
        assert!(!diff.contains(InvariantField::NodeCount));
        assert!(!diff.contains(InvariantField::EdgeCount));
    }

    #[test]
    fn test_hexagon_and_two_triangles() {
        let profiler = InvariantProfiler::default();
        let diff = InvariantDiff::between(
            &profiler.profile(&hexagon()),
            &profiler.profile(&two_triangles()),
            1e-9,
        );

        assert!(!diff.contains(InvariantField::DegreeSequence));
        assert_eq!(
            diff.get(InvariantField::TriangleCount),
            Some(&FieldDifference::Counts { left: 0, right: 2 })
        );
        assert_eq!(
            diff.get(InvariantField::CycleLengths),
            Some(&FieldDifference::Sequences {
                left: vec![6],
                right: vec![3, 3],
            })
        );
        assert!(matches!(
            diff.get(InvariantField::TwoHopDistribution),
            Some(FieldDifference::Structural { .. })
        ));
        match diff.get(InvariantField::Eigenvalues) {
            Some(FieldDifference::Spectra { left, right }) => {
                assert_eq!(left.len(), 5);
                assert_eq!(right.len(), 5);
            }
            other => panic!("expected a spectral difference, got {:?}", other),
        }
    }

    #[test]
    fn test_eigenvalue_tolerance() {
        let profile = InvariantProfiler::default().profile(&path4());
        let mut nudged = profile.clone();
        nudged.eigenvalues[0] += 1e-12;

        assert!(InvariantDiff::between(&profile, &nudged, 1e-9).is_empty());
        let exact = InvariantDiff::between(&profile, &nudged, 0.0);
        assert!(exact.contains(InvariantField::Eigenvalues));
    }

    #[test]
    fn test_missing_spectrum_is_not_evidence() {
        let profile = InvariantProfiler::default().profile(&path4());
        assert!(profile.degenerate_fields.is_empty());

        let mut degenerate = profile.clone();
        degenerate.eigenvalues.clear();
        degenerate.degenerate_fields.insert(InvariantField::Eigenvalues);
        assert!(InvariantDiff::between(&profile, &degenerate, 1e-9).is_empty());
        assert!(InvariantDiff::between(&degenerate, &profile, 1e-9).is_empty());
    }

    #[test]
    fn test_missing_cycle_basis_is_not_evidence() {
        let profiler = InvariantProfiler::default();
        let profile = profiler.profile(&hexagon());
        assert_eq!(profile.cycle_lengths, vec![6]);

        let mut degenerate = profile.clone();
        degenerate.cycle_lengths.clear();
        degenerate.cycle_count = 0;
        degenerate
            .degenerate_fields
            .extend([InvariantField::CycleLengths, InvariantField::CycleCount]);
        assert!(InvariantDiff::between(&degenerate, &profile, 1e-9).is_empty());

        // A real difference elsewhere is still reported
        let other = profiler.profile(&two_triangles());
        let diff = InvariantDiff::between(&degenerate, &other, 1e-9);
        assert!(diff.contains(InvariantField::TriangleCount));
        assert!(!diff.contains(InvariantField::CycleLengths));
        assert!(!diff.contains(InvariantField::CycleCount));
    }

    #[test]
    fn test_empty_cycle_list_without_failure_is_compared() {
        let profiler = InvariantProfiler::default();
        let (path, cycle) = (profiler.profile(&path4()), profiler.profile(&hexagon()));
        let diff = InvariantDiff::between(&path, &cycle, 1e-9);
        assert_eq!(
            diff.get(InvariantField::CycleCount),
            Some(&FieldDifference::Counts { left: 0, right: 1 })
        );
    }

    #[test]
    fn test_diff_serializes_with_field_names() {
        let profiler = InvariantProfiler::default();
        let (path, star) = (profiler.profile(&path4()), profiler.profile(&star4()));
        let diff = InvariantDiff::between(&path, &star, 1e-9);
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["degree_sequence"]["kind"], "sequences");
    }
}
