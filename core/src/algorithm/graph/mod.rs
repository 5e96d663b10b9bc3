//! Structural hashing, invariants and isomorphism verification
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod centrality;
pub mod cycle_basis;
pub mod grouping;
pub mod invariants;
pub mod isomorphism;
pub mod perturbation;
pub mod vf2;
pub mod wl_hash;

pub use self::centrality::{CentralityAnalyzer, CentralityScore};
pub use self::cycle_basis::minimum_cycle_basis_lengths;
pub use self::grouping::{EquivalenceGroup, EquivalenceGroups, GroupFinder};
pub use self::invariants::{
    FieldDifference, InvariantDiff, InvariantError, InvariantField, InvariantProfile,
    InvariantProfiler,
};
pub use self::isomorphism::{IsomorphismVerdict, IsomorphismVerifier};
pub use self::perturbation::{PerturbationError, PerturbationKind, PerturbationRecord, Perturber};
pub use self::vf2::{ExactMatcher, MatchError, NodeMapping, Vf2Matcher};
pub use self::wl_hash::{CanonicalHash, Color, ColorRefinement, StructuralHasher};
