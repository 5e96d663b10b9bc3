//! Validation of hash groups against exact isomorphism
//!
//! Every unordered pair inside the largest hash groups is verified. Pairs
//! that share a hash yet are refuted are WL-fakes: color refinement could not
//! tell them apart. Member profiles are computed once per group and pairs are
//! verified independently; results are then folded in pair order by a single
//! accumulator, so the report does not depend on scheduling.

use std::collections::BTreeMap;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::grouping::{EquivalenceGroup, GroupFinder};
use crate::algorithm::graph::invariants::{InvariantField, InvariantProfile};
use crate::algorithm::graph::isomorphism::{IsomorphismVerdict, IsomorphismVerifier};
use crate::algorithm::graph::vf2::{ExactMatcher, NodeMapping, Vf2Matcher};
use crate::algorithm::graph::wl_hash::CanonicalHash;
use crate::config::ValidationConfig;
use crate::data_structures::graph::Graph;

/// Verdict for one refuted pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAnalysis {
    pub pair: (usize, usize),
    pub verdict: IsomorphismVerdict,
}

/// A confirmed pair with its node mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingExample {
    pub pair: (usize, usize),
    pub mapping: NodeMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAnalysis {
    pub hash: CanonicalHash,
    pub size: usize,
    pub indices: Vec<usize>,
    pub all_truly_isomorphic: bool,
    pub isomorphic_pairs: Vec<(usize, usize)>,
    pub non_isomorphic_pairs: Vec<(usize, usize)>,
    /// First refuted pairs with their full verdicts
    pub detailed_analysis: Vec<PairAnalysis>,
    /// First confirmed pairs with their mappings
    pub isomorphism_mappings: Vec<MappingExample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Equivalence groups found in the dataset, analysed or not
    pub total_groups: usize,
    pub analyzed_groups: Vec<GroupAnalysis>,
    /// Some analysed group contains a refuted pair
    pub found_wl_fakes: bool,
    /// How often each invariant separated a retained WL-fake pair
    pub distinguishing_properties: BTreeMap<InvariantField, usize>,
}

#[derive(Debug, Clone)]
pub struct ValidationExperiment<M = Vf2Matcher> {
    finder: GroupFinder,
    verifier: IsomorphismVerifier<M>,
    config: ValidationConfig,
}

impl Default for ValidationExperiment<Vf2Matcher> {
    fn default() -> Self {
        Self::new(
            GroupFinder::default(),
            IsomorphismVerifier::default(),
            ValidationConfig::default(),
        )
    }
}

impl<M: ExactMatcher> ValidationExperiment<M> {
    pub fn new(
        finder: GroupFinder,
        verifier: IsomorphismVerifier<M>,
        config: ValidationConfig,
    ) -> Self {
        Self {
            finder,
            verifier,
            config,
        }
    }

    pub fn verifier(&self) -> &IsomorphismVerifier<M> {
        &self.verifier
    }

    /// [`run`](Self::run) with the configured group count
    pub fn run_configured(&self, graphs: &[Graph]) -> ValidationReport {
        self.run(graphs, self.config.groups_to_analyze)
    }

    /// Validate the `groups_to_analyze` largest hash groups of `graphs`
    pub fn run(&self, graphs: &[Graph], groups_to_analyze: usize) -> ValidationReport {
        let groups = self.finder.sorted_groups(graphs);
        let total_groups = groups.len();

        let analyzed_groups: Vec<GroupAnalysis> = groups
            .iter()
            .take(groups_to_analyze)
            .filter(|group| group.len() >= 2)
            .map(|group| self.analyze_group(graphs, group))
            .collect();

        let found_wl_fakes = analyzed_groups
            .iter()
            .any(|group| !group.non_isomorphic_pairs.is_empty());

        let mut distinguishing_properties = BTreeMap::new();
        for analysis in analyzed_groups.iter().flat_map(|group| &group.detailed_analysis) {
            if let Some(diff) = analysis.verdict.invariant_diff() {
                for field in diff.fields() {
                    *distinguishing_properties.entry(field).or_insert(0) += 1;
                }
            }
        }

        info!(
            "Validated {} of {} groups; WL-fakes found: {}",
            analyzed_groups.len(),
            total_groups,
            found_wl_fakes
        );

        ValidationReport {
            total_groups,
            analyzed_groups,
            found_wl_fakes,
            distinguishing_properties,
        }
    }

    /// Verify every unordered pair of `group`
    pub fn analyze_group(&self, graphs: &[Graph], group: &EquivalenceGroup) -> GroupAnalysis {
        let members = &group.members;
        let pairs: Vec<(usize, usize)> = (0..members.len())
            .flat_map(|i| (i + 1..members.len()).map(move |j| (i, j)))
            .collect();

        let profile = |&index: &usize| self.verifier.profile(&graphs[index]);
        let profiles: Vec<InvariantProfile> = if self.config.parallel {
            members.par_iter().map(profile).collect()
        } else {
            members.iter().map(profile).collect()
        };

        let verify = |&(i, j): &(usize, usize)| {
            let (a, b) = (members[i], members[j]);
            self.verifier
                .verify_profiled(&graphs[a], &profiles[i], &graphs[b], &profiles[j])
        };
        let verdicts: Vec<IsomorphismVerdict> = if self.config.parallel {
            pairs.par_iter().map(verify).collect()
        } else {
            pairs.iter().map(verify).collect()
        };

        let mut analysis = GroupAnalysis {
            hash: group.hash.clone(),
            size: members.len(),
            indices: members.clone(),
            all_truly_isomorphic: true,
            isomorphic_pairs: Vec::new(),
            non_isomorphic_pairs: Vec::new(),
            detailed_analysis: Vec::new(),
            isomorphism_mappings: Vec::new(),
        };

        for (&(i, j), verdict) in pairs.iter().zip(verdicts) {
            let pair = (members[i], members[j]);
            match verdict {
                IsomorphismVerdict::Confirmed(mapping) => {
                    analysis.isomorphic_pairs.push(pair);
                    if analysis.isomorphism_mappings.len() < self.config.max_retained_mappings {
                        analysis.isomorphism_mappings.push(MappingExample { pair, mapping });
                    }
                }
                refuted => {
                    analysis.all_truly_isomorphic = false;
                    analysis.non_isomorphic_pairs.push(pair);
                    if analysis.detailed_analysis.len() < self.config.max_detailed_pairs {
                        analysis.detailed_analysis.push(PairAnalysis { pair, verdict: refuted });
                    }
                }
            }
        }

        debug!(
            "Group {}: {} isomorphic pairs, {} non-isomorphic pairs",
            analysis.hash,
            analysis.isomorphic_pairs.len(),
            analysis.non_isomorphic_pairs.len()
        );
        analysis
    }
}
