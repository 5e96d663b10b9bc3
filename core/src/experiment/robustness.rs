//! Perturbation robustness of hash-based grouping
//!
//! Each original graph is joined by `k` single-edge variants of itself and the
//! combined collection is grouped again. The headline signal is whether some
//! resulting group still holds every original graph; partial fragmentation is
//! visible in the per-group breakdown but not scored.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::grouping::GroupFinder;
use crate::algorithm::graph::perturbation::{PerturbationRecord, Perturber};
use crate::algorithm::graph::wl_hash::CanonicalHash;
use crate::config::RobustnessConfig;
use crate::data_structures::graph::Graph;

/// Where a member of the combined collection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum MemberOrigin {
    Original { index: usize },
    Perturbed { original: usize, perturbation: usize },
}

/// One attempted perturbation, successful or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerturbationEntry {
    pub original: usize,
    pub perturbation: usize,
    pub record: Option<PerturbationRecord>,
    /// Why no copy was produced
    pub error: Option<String>,
}

/// A perturbed copy inside a resulting group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerturbedMember {
    pub original: usize,
    pub perturbation: usize,
    pub record: PerturbationRecord,
}

/// Composition of one equivalence group of the combined collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobustnessGroup {
    pub hash: CanonicalHash,
    pub size: usize,
    /// Original graphs in the group, in input order
    pub original_indices: Vec<usize>,
    pub perturbed_members: Vec<PerturbedMember>,
}

impl RobustnessGroup {
    pub fn perturbation_records(&self) -> impl Iterator<Item = &PerturbationRecord> {
        self.perturbed_members.iter().map(|member| &member.record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobustnessReport {
    pub original_count: usize,
    pub perturbations_per_graph: usize,
    pub combined_count: usize,
    /// Dataset index of each original when the originals were drawn from a
    /// larger dataset
    pub source_indices: Option<Vec<usize>>,
    pub perturbations: Vec<PerturbationEntry>,
    pub groups: Vec<RobustnessGroup>,
    /// Some group contains every original graph
    pub original_group_intact: bool,
}

impl RobustnessReport {
    /// Dataset index of local original `index`
    pub fn dataset_index(&self, index: usize) -> usize {
        self.source_indices
            .as_ref()
            .and_then(|indices| indices.get(index).copied())
            .unwrap_or(index)
    }

    pub fn failed_perturbations(&self) -> usize {
        self.perturbations.iter().filter(|entry| entry.record.is_none()).count()
    }
}

/// Originals followed by their perturbed copies
#[derive(Debug, Clone)]
pub struct CombinedCollection {
    pub graphs: Vec<Graph>,
    pub origins: Vec<MemberOrigin>,
    pub perturbations: Vec<PerturbationEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct RobustnessExperiment {
    finder: GroupFinder,
    perturber: Perturber,
    config: RobustnessConfig,
}

impl RobustnessExperiment {
    pub fn new(finder: GroupFinder, config: RobustnessConfig) -> Self {
        Self {
            finder,
            perturber: Perturber::new(),
            config,
        }
    }

    pub fn config(&self) -> &RobustnessConfig {
        &self.config
    }

    /// [`run`](Self::run) with the configured number of copies per graph
    pub fn run_configured(&self, graphs: &[Graph]) -> RobustnessReport {
        self.run(graphs, self.config.perturbations_per_graph)
    }

    /// Run with a generator seeded from the configuration
    pub fn run(&self, graphs: &[Graph], perturbations_per_graph: usize) -> RobustnessReport {
        let mut rng = ChaCha20Rng::seed_from_u64(self.config.seed);
        self.run_with_rng(graphs, perturbations_per_graph, &mut rng)
    }

    pub fn run_with_rng<R>(
        &self,
        graphs: &[Graph],
        perturbations_per_graph: usize,
        rng: &mut R,
    ) -> RobustnessReport
    where
        R: Rng + ?Sized,
    {
        let combined = self.combine(graphs, perturbations_per_graph, rng);
        let record_of = |original: usize, perturbation: usize| {
            combined
                .perturbations
                .iter()
                .find(|entry| entry.original == original && entry.perturbation == perturbation)
                .and_then(|entry| entry.record)
        };

        let mut groups = Vec::new();
        for group in self.finder.sorted_groups(&combined.graphs) {
            let mut original_indices = Vec::new();
            let mut perturbed_members = Vec::new();
            for &member in &group.members {
                match combined.origins[member] {
                    MemberOrigin::Original { index } => original_indices.push(index),
                    MemberOrigin::Perturbed { original, perturbation } => {
                        if let Some(record) = record_of(original, perturbation) {
                            perturbed_members.push(PerturbedMember {
                                original,
                                perturbation,
                                record,
                            });
                        }
                    }
                }
            }
            groups.push(RobustnessGroup {
                hash: group.hash,
                size: group.members.len(),
                original_indices,
                perturbed_members,
            });
        }

        let original_group_intact = !graphs.is_empty()
            && groups
                .iter()
                .any(|group| group.original_indices.len() == graphs.len());

        info!(
            "Robustness run: {} originals, {} combined graphs, {} groups, originals intact: {}",
            graphs.len(),
            combined.graphs.len(),
            groups.len(),
            original_group_intact
        );

        RobustnessReport {
            original_count: graphs.len(),
            perturbations_per_graph,
            combined_count: combined.graphs.len(),
            source_indices: None,
            perturbations: combined.perturbations,
            groups,
            original_group_intact,
        }
    }

    /// Originals, then `perturbations_per_graph` copies of each in order
    ///
    /// A copy that cannot be produced is left out of the collection and
    /// recorded with its error.
    pub fn combine<R>(
        &self,
        graphs: &[Graph],
        perturbations_per_graph: usize,
        rng: &mut R,
    ) -> CombinedCollection
    where
        R: Rng + ?Sized,
    {
        let mut combined = CombinedCollection {
            graphs: graphs.to_vec(),
            origins: (0..graphs.len()).map(|index| MemberOrigin::Original { index }).collect(),
            perturbations: Vec::with_capacity(graphs.len() * perturbations_per_graph),
        };

        for (original, graph) in graphs.iter().enumerate() {
            for perturbation in 0..perturbations_per_graph {
                match self.perturber.perturb(graph, rng) {
                    Ok((copy, record)) => {
                        combined.graphs.push(copy);
                        combined.origins.push(MemberOrigin::Perturbed { original, perturbation });
                        combined.perturbations.push(PerturbationEntry {
                            original,
                            perturbation,
                            record: Some(record),
                            error: None,
                        });
                    }
                    Err(error) => {
                        warn!(
                            "Skipping perturbation {} of graph {}: {}",
                            perturbation, original, error
                        );
                        combined.perturbations.push(PerturbationEntry {
                            original,
                            perturbation,
                            record: None,
                            error: Some(error.to_string()),
                        });
                    }
                }
            }
        }
        combined
    }

    /// Run on the members of the largest equivalence group of `dataset`
    pub fn run_on_largest_group(
        &self,
        dataset: &[Graph],
        perturbations_per_graph: usize,
    ) -> Option<RobustnessReport> {
        let group = self.finder.largest_group(dataset)?;
        let members: Vec<Graph> = group
            .members
            .iter()
            .map(|&index| dataset[index].clone())
            .collect();

        let mut report = self.run(&members, perturbations_per_graph);
        report.source_indices = Some(group.members);
        Some(report)
    }
}
