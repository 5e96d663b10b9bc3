//! Two-stage isomorphism verification
//!
//! Verification runs from cheapest to most expensive and stops at the first
//! conclusive stage:
//!
//! 1. node and edge counts;
//! 2. the full [`InvariantProfile`] comparison, where any mismatch is
//!    authoritative and yields [`IsomorphismVerdict::RefutedByInvariant`];
//! 3. the exact matcher, only when every invariant agrees.
//!
//! Matcher failures never escape: they become a
//! [`IsomorphismVerdict::Refuted`] carrying the failure text.
//!
//! # Performance Characteristics
//!
//! - Stages 1-2: O(N^3) for the eigendecomposition, O(N * E) for the cycle basis
//! - Stage 3: exponential worst case, bounded by the matcher's state budget

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::invariants::{InvariantDiff, InvariantProfile, InvariantProfiler};
use crate::algorithm::graph::vf2::{ExactMatcher, MatchError, NodeMapping, Vf2Matcher};
use crate::algorithm::traits::{
    parse_optional_limit, parse_parameter, render_optional_limit, Algorithm, AlgorithmError,
};
use crate::config::VerifierConfig;
use crate::data_structures::graph::Graph;

/// Reason recorded when node or edge counts differ
pub const SIZE_MISMATCH: &str = "different number of nodes or edges";
/// Reason recorded when the exact search proves there is no mapping
pub const NO_ISOMORPHISM: &str = "no isomorphism found";
/// Reason recorded when the exact search runs out of budget
pub const BUDGET_EXCEEDED: &str = "search budget exceeded";

/// Outcome of comparing two graphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum IsomorphismVerdict {
    /// The graphs are isomorphic under this mapping from the first onto the second
    Confirmed(NodeMapping),
    Refuted(String),
    /// At least one invariant differs
    RefutedByInvariant(InvariantDiff),
}

impl IsomorphismVerdict {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    pub fn is_refuted(&self) -> bool {
        !self.is_confirmed()
    }

    pub fn mapping(&self) -> Option<&NodeMapping> {
        match self {
            Self::Confirmed(mapping) => Some(mapping),
            _ => None,
        }
    }

    pub fn invariant_diff(&self) -> Option<&InvariantDiff> {
        match self {
            Self::RefutedByInvariant(diff) => Some(diff),
            _ => None,
        }
    }
}

/// Invariant-first isomorphism verifier
#[derive(Debug, Clone)]
pub struct IsomorphismVerifier<M = Vf2Matcher> {
    config: VerifierConfig,
    profiler: InvariantProfiler,
    matcher: M,
}

impl IsomorphismVerifier<Vf2Matcher> {
    pub fn new(config: VerifierConfig) -> Self {
        let matcher = Vf2Matcher::new(config.max_states);
        Self::with_matcher(config, matcher)
    }
}

impl Default for IsomorphismVerifier<Vf2Matcher> {
    fn default() -> Self {
        Self::new(VerifierConfig::default())
    }
}

impl<M: ExactMatcher> IsomorphismVerifier<M> {
    pub fn with_matcher(config: VerifierConfig, matcher: M) -> Self {
        let profiler = InvariantProfiler::new(&config);
        Self {
            config,
            profiler,
            matcher,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn profiler(&self) -> &InvariantProfiler {
        &self.profiler
    }

    pub fn profile(&self, graph: &Graph) -> InvariantProfile {
        self.profiler.profile(graph)
    }

    /// Decide whether `g1` and `g2` are isomorphic
    pub fn verify(&self, g1: &Graph, g2: &Graph) -> IsomorphismVerdict {
        if let Some(verdict) = Self::cheap_rejection(g1, g2) {
            return verdict;
        }
        let profile_1 = self.profiler.profile(g1);
        let profile_2 = self.profiler.profile(g2);
        self.verify_profiled(g1, &profile_1, g2, &profile_2)
    }

    /// [`verify`](Self::verify) with profiles the caller already holds
    pub fn verify_profiled(
        &self,
        g1: &Graph,
        profile_1: &InvariantProfile,
        g2: &Graph,
        profile_2: &InvariantProfile,
    ) -> IsomorphismVerdict {
        if let Some(verdict) = Self::cheap_rejection(g1, g2) {
            return verdict;
        }

        let diff = InvariantDiff::between(profile_1, profile_2, self.config.eigenvalue_tolerance);
        if !diff.is_empty() {
            debug!("Invariants differ on {} fields; skipping exact search", diff.len());
            return IsomorphismVerdict::RefutedByInvariant(diff);
        }

        match self.matcher.find_isomorphism(g1, g2) {
            Ok(Some(mapping)) => IsomorphismVerdict::Confirmed(mapping),
            Ok(None) => IsomorphismVerdict::Refuted(NO_ISOMORPHISM.to_string()),
            Err(MatchError::BudgetExceeded { explored }) => {
                warn!("Exact search gave up after {} states", explored);
                IsomorphismVerdict::Refuted(BUDGET_EXCEEDED.to_string())
            }
            Err(error) => {
                warn!("Exact search failed: {}", error);
                IsomorphismVerdict::Refuted(error.to_string())
            }
        }
    }

    /// `Refuted` when node or edge counts differ
    pub fn cheap_rejection(g1: &Graph, g2: &Graph) -> Option<IsomorphismVerdict> {
        (g1.node_count() != g2.node_count() || g1.edge_count() != g2.edge_count())
            .then(|| IsomorphismVerdict::Refuted(SIZE_MISMATCH.to_string()))
    }
}

impl Algorithm for IsomorphismVerifier<Vf2Matcher> {
    fn name(&self) -> &str {
        "Invariant-First Isomorphism Verification"
    }

    fn category(&self) -> &str {
        "isomorphism"
    }

    fn description(&self) -> &str {
        "Compares degree sequence, cycle basis, triangles, 2-hop degree profile and adjacency \
         spectrum before falling back to a budgeted VF2 search."
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        match name {
            "max_states" => {
                let max_states = parse_optional_limit(name, value)?;
                self.config.max_states = max_states;
                self.matcher.set_max_states(max_states);
            }
            "eigenvalue_tolerance" => {
                let tolerance: f64 = parse_parameter(name, value)?;
                if !tolerance.is_finite() || tolerance < 0.0 {
                    return Err(AlgorithmError::invalid(
                        name,
                        "must be a finite non-negative number",
                    ));
                }
                self.config.eigenvalue_tolerance = tolerance;
            }
            _ => return Err(AlgorithmError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "max_states" => Some(render_optional_limit(self.config.max_states)),
            "eigenvalue_tolerance" => Some(self.config.eigenvalue_tolerance.to_string()),
            _ => None,
        }
    }

    fn get_parameters(&self) -> HashMap<String, String> {
        ["max_states", "eigenvalue_tolerance"]
            .into_iter()
            .filter_map(|name| self.get_parameter(name).map(|value| (name.to_string(), value)))
            .collect()
    }
}
