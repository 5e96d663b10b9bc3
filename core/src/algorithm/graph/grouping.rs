//! Hash-equivalence grouping of graph collections
//!
//! Graphs are bucketed by [`CanonicalHash`]; buckets keep input order and
//! singletons are dropped. Zero-node graphs are never hashed and never grouped.

use std::collections::BTreeMap;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::wl_hash::{CanonicalHash, StructuralHasher};
use crate::data_structures::graph::Graph;

/// Graph indices sharing one structural hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceGroup {
    pub hash: CanonicalHash,
    /// Indices into the analysed collection, in input order
    pub members: Vec<usize>,
}

impl EquivalenceGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Mapping from structural hash to the (two or more) graphs sharing it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquivalenceGroups(BTreeMap<CanonicalHash, Vec<usize>>);

impl EquivalenceGroups {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, hash: &CanonicalHash) -> Option<&[usize]> {
        self.0.get(hash).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalHash, &[usize])> {
        self.0.iter().map(|(hash, members)| (hash, members.as_slice()))
    }

    /// Hash of the group containing `index`, if any
    pub fn group_of(&self, index: usize) -> Option<&CanonicalHash> {
        self.0
            .iter()
            .find_map(|(hash, members)| members.contains(&index).then_some(hash))
    }

    /// Groups ordered by descending size, ties broken by first member
    pub fn sorted(&self) -> Vec<EquivalenceGroup> {
        let mut groups: Vec<EquivalenceGroup> = self
            .0
            .iter()
            .map(|(hash, members)| EquivalenceGroup {
                hash: hash.clone(),
                members: members.clone(),
            })
            .collect();
        groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.members[0].cmp(&b.members[0])));
        groups
    }

    pub fn into_inner(self) -> BTreeMap<CanonicalHash, Vec<usize>> {
        self.0
    }
}

/// Partitions graph collections into structural-hash groups
#[derive(Debug, Clone, Default)]
pub struct GroupFinder {
    hasher: StructuralHasher,
}

impl GroupFinder {
    pub fn new(hasher: StructuralHasher) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &StructuralHasher {
        &self.hasher
    }

    pub fn hasher_mut(&mut self) -> &mut StructuralHasher {
        &mut self.hasher
    }

    /// Group `graphs` by structural hash
    pub fn find_groups(&self, graphs: &[Graph]) -> EquivalenceGroups {
        let hash_one = |(index, graph): (usize, &Graph)| {
            (!graph.is_empty()).then(|| (index, self.hasher.hash(graph)))
        };

        // Hashes are computed independently, then bucketed by one accumulator
        let hashes: Vec<(usize, CanonicalHash)> = if self.hasher.config().parallel {
            graphs.par_iter().enumerate().filter_map(hash_one).collect()
        } else {
            graphs.iter().enumerate().filter_map(hash_one).collect()
        };

        let mut buckets: BTreeMap<CanonicalHash, Vec<usize>> = BTreeMap::new();
        for (index, hash) in hashes {
            buckets.entry(hash).or_default().push(index);
        }
        let bucket_count = buckets.len();
        buckets.retain(|_, members| members.len() > 1);

        info!(
            "Hashed {} graphs into {} buckets; {} equivalence groups",
            graphs.len(),
            bucket_count,
            buckets.len()
        );
        EquivalenceGroups(buckets)
    }

    /// Groups of `graphs` by descending size, ties broken by first member
    pub fn sorted_groups(&self, graphs: &[Graph]) -> Vec<EquivalenceGroup> {
        self.find_groups(graphs).sorted()
    }

    /// Largest equivalence group, ties broken by first member
    pub fn largest_group(&self, graphs: &[Graph]) -> Option<EquivalenceGroup> {
        let largest = self.sorted_groups(graphs).into_iter().next();
        if let Some(group) = &largest {
            debug!("Largest equivalence group has {} members", group.len());
        }
        largest
    }
}
