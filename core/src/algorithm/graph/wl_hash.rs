//! Weisfeiler-Lehman structural hashing
//!
//! Colors are seeded from binned betweenness centrality and refined by
//! repeatedly hashing each node's `(color, sorted neighbor colors)` signature.
//! The canonical hash is the sorted multiset of final colors, which makes it
//! invariant under node relabeling. Equal hashes do not imply isomorphism.
//!
//! # Signature hashing
//!
//! Signatures are hashed to 64 bits with a fixed-key SipHash, so colors are
//! stable within and across runs. Distinct signatures colliding is possible
//! in principle but not a practical concern for graphs of a few hundred nodes.
//! A node without neighbors keeps its color: its signature carries no
//! information beyond the color itself.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::centrality::CentralityAnalyzer;
use crate::algorithm::traits::{
    parse_optional_limit, parse_parameter, render_optional_limit, Algorithm, AlgorithmError, NodeId,
};
use crate::config::HasherConfig;
use crate::data_structures::graph::Graph;

/// Opaque node color
pub type Color = u64;

/// Spread below which all centralities count as equal
const CENTRALITY_EPSILON: f64 = 1e-12;

/// Slack added before flooring a bin position, so summation noise on a bin
/// edge cannot move a node into the lower bin
const BIN_EDGE_EPSILON: f64 = 1e-9;

/// Canonical structural hash: the sorted final colors of a graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalHash(String);

impl CanonicalHash {
    fn from_sorted_colors(colors: &[Color]) -> Self {
        let rendered: Vec<String> = colors.iter().map(Color::to_string).collect();
        Self(format!("[{}]", rendered.join(", ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CanonicalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of color refinement on one graph
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRefinement {
    /// Final color of every node
    pub colors: BTreeMap<NodeId, Color>,
    /// Refinement rounds executed
    pub rounds: usize,
    /// Whether a round left every color unchanged
    pub converged: bool,
}

/// Color-refinement hasher seeded by betweenness centrality
#[derive(Debug, Clone)]
pub struct StructuralHasher {
    config: HasherConfig,
    centrality: CentralityAnalyzer,
}

impl StructuralHasher {
    pub fn new(config: HasherConfig) -> Self {
        let centrality = CentralityAnalyzer::new(true, config.parallel);
        Self { config, centrality }
    }

    pub fn config(&self) -> &HasherConfig {
        &self.config
    }

    /// Canonical hash of `graph`
    pub fn hash(&self, graph: &Graph) -> CanonicalHash {
        let refinement = self.refine(graph);
        let mut colors: Vec<Color> = refinement.colors.into_values().collect();
        colors.sort_unstable();
        CanonicalHash::from_sorted_colors(&colors)
    }

    /// Initial colors: the centrality bin of every node
    ///
    /// Every node gets color `0` when all centralities are equal (including
    /// single-node and edgeless graphs). Otherwise `[min, max]` is split into
    /// `bins` equal-width bins and the maximum falls into the last one.
    pub fn initial_colors(&self, graph: &Graph) -> BTreeMap<NodeId, Color> {
        let scores = self.centrality.compute_betweenness_centrality(graph);
        let (min, max) = scores
            .values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));

        if scores.is_empty() || max - min <= CENTRALITY_EPSILON {
            return scores.keys().map(|&node| (node, 0)).collect();
        }

        let bins = self.config.bins.max(1);
        let width = (max - min) / bins as f64;
        scores
            .into_iter()
            .map(|(node, score)| {
                let position = ((score - min) / width + BIN_EDGE_EPSILON).floor() as usize;
                (node, position.min(bins - 1) as Color)
            })
            .collect()
    }

    /// Run color refinement to a fixed point or the round limit
    pub fn refine(&self, graph: &Graph) -> ColorRefinement {
        let mut colors = self.initial_colors(graph);
        let round_limit = self
            .config
            .max_rounds
            .map_or(graph.node_count(), |cap| cap.min(graph.node_count()));

        let mut rounds = 0;
        let mut converged = false;
        while rounds < round_limit {
            let next = refine_round(graph, &colors);
            rounds += 1;
            if next == colors {
                converged = true;
                break;
            }
            colors = next;
        }

        debug!(
            "Color refinement finished after {} rounds on {} nodes (converged: {})",
            rounds,
            graph.node_count(),
            converged
        );

        ColorRefinement {
            colors,
            rounds,
            converged,
        }
    }
}

impl Default for StructuralHasher {
    fn default() -> Self {
        Self::new(HasherConfig::default())
    }
}

/// One refinement round over every node
fn refine_round(graph: &Graph, colors: &BTreeMap<NodeId, Color>) -> BTreeMap<NodeId, Color> {
    colors
        .iter()
        .map(|(&node, &color)| {
            let mut neighbor_colors: Vec<Color> =
                graph.neighbors(node).map(|n| colors[&n]).collect();
            if neighbor_colors.is_empty() {
                return (node, color);
            }
            neighbor_colors.sort_unstable();
            (node, signature_color(color, &neighbor_colors))
        })
        .collect()
}

fn signature_color(color: Color, neighbor_colors: &[Color]) -> Color {
    let mut hasher = DefaultHasher::new();
    color.hash(&mut hasher);
    neighbor_colors.hash(&mut hasher);
    hasher.finish()
}

impl Algorithm for StructuralHasher {
    fn name(&self) -> &str {
        "Weisfeiler-Lehman Structural Hash"
    }

    fn category(&self) -> &str {
        "hashing"
    }

    fn description(&self) -> &str {
        "Iterative color refinement seeded by binned betweenness centrality; \
         hashes the sorted multiset of final node colors."
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        match name {
            "bins" => {
                let bins: usize = parse_parameter(name, value)?;
                if bins == 0 {
                    return Err(AlgorithmError::invalid(name, "must be positive"));
                }
                self.config.bins = bins;
            }
            "max_rounds" => self.config.max_rounds = parse_optional_limit(name, value)?,
            "parallel" => {
                self.config.parallel = parse_parameter(name, value)?;
                self.centrality.set_parameter(name, value)?;
            }
            _ => return Err(AlgorithmError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "bins" => Some(self.config.bins.to_string()),
            "max_rounds" => Some(render_optional_limit(self.config.max_rounds)),
            "parallel" => Some(self.config.parallel.to_string()),
            _ => None,
        }
    }

    fn get_parameters(&self) -> HashMap<String, String> {
        ["bins", "max_rounds", "parallel"]
            .into_iter()
            .filter_map(|name| self.get_parameter(name).map(|value| (name.to_string(), value)))
            .collect()
    }
}
