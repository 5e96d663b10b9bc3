//! Experiments over graph collections: robustness to perturbation and
//! validation of hash groups against exact isomorphism
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod robustness;
pub mod validation;

pub use self::robustness::{
    CombinedCollection, MemberOrigin, PerturbationEntry, PerturbedMember, RobustnessExperiment,
    RobustnessGroup, RobustnessReport,
};
pub use self::validation::{
    GroupAnalysis, MappingExample, PairAnalysis, ValidationExperiment, ValidationReport,
};
