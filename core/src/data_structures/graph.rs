//! Undirected simple graph used by every analysis in the crate
//!
//! Nodes are small non-negative identifiers (not necessarily contiguous);
//! edges are unordered pairs of distinct nodes stored once per endpoint in
//! ordered adjacency sets, so every traversal is deterministic.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::traits::NodeId;

/// Structural errors raised while building or relabeling a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Edge references a node that is not part of the graph
    #[error("Invalid graph: edge ({from}, {to}) references nonexistent node {missing}")]
    InvalidGraph {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },

    /// Self-loops are not part of the simple-graph model
    #[error("Invalid graph: self-loop on node {0}")]
    SelfLoop(NodeId),

    /// The graph source has no record at the requested index
    #[error("Graph source has no record at index {0}")]
    MissingRecord(usize),

    /// A relabeling was not a bijection onto a node set
    #[error("Invalid relabeling: {0}")]
    InvalidRelabeling(String),
}

/// External record a graph source hands to the core
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Node identifiers
    pub nodes: Vec<usize>,
    /// Undirected edges; orientation and duplicates are ignored
    pub edges: Vec<(usize, usize)>,
    /// Optional per-node feature vectors (carried, never analysed)
    #[serde(default)]
    pub node_attributes: BTreeMap<usize, Vec<f64>>,
}

/// Undirected simple graph with ordered adjacency sets
///
/// Serialized as a [`GraphRecord`]; deserialization runs the same checks as
/// [`Graph::try_from`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphRecord", into = "GraphRecord")]
pub struct Graph {
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
    edge_count: usize,
    node_attributes: BTreeMap<NodeId, Vec<f64>>,
}

impl Graph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an edgeless graph on the given nodes
    pub fn with_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node.into());
        }
        graph
    }

    /// Builds a graph from node ids and undirected edges
    pub fn from_edges<N, E>(nodes: N, edges: E) -> Result<Self, GraphError>
    where
        N: IntoIterator<Item = usize>,
        E: IntoIterator<Item = (usize, usize)>,
    {
        let mut graph = Self::with_nodes(nodes);
        for (source, target) in edges {
            graph.add_edge(NodeId(source), NodeId(target))?;
        }
        Ok(graph)
    }

    /// Adds a node; returns `false` if it was already present
    pub fn add_node(&mut self, id: NodeId) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }
        self.adjacency.insert(id, BTreeSet::new());
        true
    }

    /// Adds an undirected edge between two existing nodes
    ///
    /// Returns `Ok(false)` when the edge already exists.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<bool, GraphError> {
        if source == target {
            return Err(GraphError::SelfLoop(source));
        }
        for endpoint in [source, target] {
            if !self.adjacency.contains_key(&endpoint) {
                return Err(GraphError::InvalidGraph {
                    from: source,
                    to: target,
                    missing: endpoint,
                });
            }
        }

        let inserted = self
            .adjacency
            .get_mut(&source)
            .map_or(false, |neighbors| neighbors.insert(target));
        if inserted {
            if let Some(neighbors) = self.adjacency.get_mut(&target) {
                neighbors.insert(source);
            }
            self.edge_count += 1;
        }
        Ok(inserted)
    }

    /// Removes an undirected edge; returns `false` if it was absent
    pub fn remove_edge(&mut self, source: NodeId, target: NodeId) -> bool {
        let removed = self
            .adjacency
            .get_mut(&source)
            .map_or(false, |neighbors| neighbors.remove(&target));
        if removed {
            if let Some(neighbors) = self.adjacency.get_mut(&target) {
                neighbors.remove(&source);
            }
            self.edge_count -= 1;
        }
        removed
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    #[inline]
    pub fn has_node(&self, id: NodeId) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId) -> bool {
        self.adjacency
            .get(&source)
            .map_or(false, |neighbors| neighbors.contains(&target))
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Neighbors of a node in ascending id order (empty for unknown nodes)
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeSet::len)
    }

    /// Each undirected edge once, as `(u, v)` with `u < v`, in lexicographic order
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.adjacency.iter().flat_map(|(&source, neighbors)| {
            neighbors
                .range((std::ops::Bound::Excluded(source), std::ops::Bound::Unbounded))
                .map(move |&target| (source, target))
        })
    }

    /// Dense position of every node, in ascending id order
    pub fn node_index(&self) -> BTreeMap<NodeId, usize> {
        self.nodes().enumerate().map(|(index, id)| (id, index)).collect()
    }

    /// Adjacency lists over dense positions (see [`Graph::node_index`])
    pub fn dense_adjacency(&self) -> Vec<Vec<usize>> {
        let index = self.node_index();
        self.adjacency
            .values()
            .map(|neighbors| neighbors.iter().map(|n| index[n]).collect())
            .collect()
    }

    pub fn node_attributes(&self, id: NodeId) -> Option<&[f64]> {
        self.node_attributes.get(&id).map(Vec::as_slice)
    }

    /// Attaches a feature vector to an existing node
    pub fn set_node_attributes(
        &mut self,
        id: NodeId,
        attributes: Vec<f64>,
    ) -> Result<(), GraphError> {
        if !self.has_node(id) {
            return Err(GraphError::InvalidGraph {
                from: id,
                to: id,
                missing: id,
            });
        }
        self.node_attributes.insert(id, attributes);
        Ok(())
    }

    /// Copy of this graph with every node renamed through `mapping`
    ///
    /// `mapping` must cover every node and be injective; attributes follow
    /// their node.
    pub fn relabel(&self, mapping: &BTreeMap<NodeId, NodeId>) -> Result<Graph, GraphError> {
        let mut relabeled = Graph::new();
        for node in self.nodes() {
            let target = mapping.get(&node).copied().ok_or_else(|| {
                GraphError::InvalidRelabeling(format!("node {} has no image", node))
            })?;
            if !relabeled.add_node(target) {
                return Err(GraphError::InvalidRelabeling(format!(
                    "node {} is the image of more than one node",
                    target
                )));
            }
        }
        for (source, target) in self.edges() {
            relabeled.add_edge(mapping[&source], mapping[&target])?;
        }
        for (node, attributes) in &self.node_attributes {
            relabeled.node_attributes.insert(mapping[node], attributes.clone());
        }
        Ok(relabeled)
    }
}

impl TryFrom<GraphRecord> for Graph {
    type Error = GraphError;

    fn try_from(record: GraphRecord) -> Result<Self, Self::Error> {
        let mut graph = Graph::from_edges(record.nodes, record.edges)?;
        for (node, attributes) in record.node_attributes {
            graph.set_node_attributes(NodeId(node), attributes)?;
        }
        Ok(graph)
    }
}

impl From<&Graph> for GraphRecord {
    fn from(graph: &Graph) -> Self {
        GraphRecord {
            nodes: graph.nodes().map(NodeId::as_usize).collect(),
            edges: graph.edges().map(|(u, v)| (u.0, v.0)).collect(),
            node_attributes: graph
                .node_attributes
                .iter()
                .map(|(node, attributes)| (node.0, attributes.clone()))
                .collect(),
        }
    }
}

impl From<Graph> for GraphRecord {
    fn from(graph: Graph) -> Self {
        GraphRecord::from(&graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> Graph {
        Graph::from_edges(0..4, [(0, 1), (1, 2), (2, 3)]).unwrap()
    }

    #[test]
    fn test_graph_creation() {
        let graph = path4();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.has_edge(NodeId(1), NodeId(0)));
        assert!(!graph.has_edge(NodeId(0), NodeId(3)));
        assert_eq!(graph.degree(NodeId(1)), 2);
        assert_eq!(graph.degree(NodeId(9)), 0);
    }

    #[test]
    fn test_edges_are_listed_once() {
        let graph = path4();
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(
            edges,
            vec![(NodeId(0), NodeId(1)), (NodeId(1), NodeId(2)), (NodeId(2), NodeId(3))]
        );
    }

    #[test]
    fn test_duplicate_edges_are_ignored() {
        let graph = Graph::from_edges(0..2, [(0, 1), (1, 0)]).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_invalid_edges_rejected() {
        let missing = Graph::from_edges(0..2, [(0, 5)]);
        assert_eq!(
            missing,
            Err(GraphError::InvalidGraph {
                from: NodeId(0),
                to: NodeId(5),
                missing: NodeId(5),
            })
        );

        let looped = Graph::from_edges(0..2, [(1, 1)]);
        assert_eq!(looped, Err(GraphError::SelfLoop(NodeId(1))));
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = path4();
        assert!(graph.remove_edge(NodeId(2), NodeId(1)));
        assert!(!graph.remove_edge(NodeId(2), NodeId(1)));
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.has_edge(NodeId(1), NodeId(2)));
    }

    #[test]
    fn test_non_contiguous_ids() {
        let graph = Graph::from_edges([3, 10, 42], [(3, 42)]).unwrap();
        let index = graph.node_index();
        assert_eq!(index[&NodeId(42)], 2);
        assert_eq!(graph.dense_adjacency(), vec![vec![2], vec![], vec![0]]);
    }

    #[test]
    fn test_relabel() {
        let graph = path4();
        let mapping: BTreeMap<NodeId, NodeId> = [(0, 3), (1, 2), (2, 1), (3, 0)]
            .into_iter()
            .map(|(a, b)| (NodeId(a), NodeId(b)))
            .collect();
        let relabeled = graph.relabel(&mapping).unwrap();
        assert_eq!(relabeled.edge_count(), 3);
        assert!(relabeled.has_edge(NodeId(3), NodeId(2)));

        let mut collapsing = mapping.clone();
        collapsing.insert(NodeId(0), NodeId(1));
        assert!(matches!(graph.relabel(&collapsing), Err(GraphError::InvalidRelabeling(_))));

        collapsing.remove(&NodeId(0));
        assert!(matches!(graph.relabel(&collapsing), Err(GraphError::InvalidRelabeling(_))));
    }

    #[test]
    fn test_record_round_trip() {
        let record = GraphRecord {
            nodes: vec![0, 1, 2],
            edges: vec![(1, 0), (2, 1)],
            node_attributes: BTreeMap::from([(0, vec![1.0, 0.0])]),
        };
        let graph = Graph::try_from(record).unwrap();
        assert_eq!(graph.node_attributes(NodeId(0)), Some(&[1.0, 0.0][..]));

        let back = GraphRecord::from(&graph);
        assert_eq!(back.edges, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_record_with_unknown_node_is_invalid() {
        let record = GraphRecord {
            nodes: vec![0],
            edges: vec![(0, 1)],
            ..Default::default()
        };
        assert!(matches!(Graph::try_from(record), Err(GraphError::InvalidGraph { .. })));
    }

    #[test]
    fn test_json_goes_through_record_validation() {
        let graph = Graph::from_edges([0, 1, 7], [(7, 0), (0, 1)]).unwrap();
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"], serde_json::json!([0, 1, 7]));
        assert_eq!(json["edges"], serde_json::json!([[0, 1], [0, 7]]));

        let back: Graph = serde_json::from_value(json).unwrap();
        assert_eq!(back, graph);
        assert_eq!(back.edge_count(), 2);
    }

    #[test]
    fn test_malformed_json_graph_is_invalid() {
        let dangling = r#"{"nodes":[0,1],"edges":[[0,5]]}"#;
        let err = serde_json::from_str::<Graph>(dangling).unwrap_err();
        let expected = GraphError::InvalidGraph {
            from: NodeId(0),
            to: NodeId(5),
            missing: NodeId(5),
        };
        assert!(err.to_string().starts_with(&expected.to_string()), "{}", err);

        let looped = r#"{"nodes":[0,1],"edges":[[1,1]]}"#;
        let err = serde_json::from_str::<Graph>(looped).unwrap_err();
        assert!(err.to_string().starts_with(&GraphError::SelfLoop(NodeId(1)).to_string()));

        // Raw adjacency with an inconsistent edge count is not an accepted form
        let raw = r#"{"adjacency":{"0":[5],"1":[]},"edge_count":1}"#;
        assert!(serde_json::from_str::<Graph>(raw).is_err());
    }
}
