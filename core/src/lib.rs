//! Isoscope core: structural hashing and isomorphism validation for graph
//! collections
//!
//! Graphs are grouped by a Weisfeiler-Lehman color-refinement hash seeded by
//! betweenness centrality. Groups are then checked against secondary
//! invariants and an exact VF2 search to expose hash collisions between
//! non-isomorphic graphs, and stress-tested by single-edge perturbations.
//!
//! # Pipeline
//!
//! - [`GroupFinder`] buckets a collection by [`CanonicalHash`]
//! - [`IsomorphismVerifier`] compares [`InvariantProfile`]s before any exact search
//! - [`ValidationExperiment`] and [`RobustnessExperiment`] produce plain,
//!   serializable reports
//!
//! The library logs through the `log` facade and never installs a logger.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod config;
pub mod data_structures;
pub mod experiment;

pub use crate::algorithm::graph::{
    CanonicalHash, ExactMatcher, GroupFinder, InvariantDiff, InvariantField, InvariantProfile,
    InvariantProfiler, IsomorphismVerdict, IsomorphismVerifier, NodeMapping, PerturbationError,
    PerturbationKind, PerturbationRecord, Perturber, StructuralHasher, Vf2Matcher,
};
pub use crate::algorithm::traits::{Algorithm, AlgorithmError, NodeId};
pub use crate::config::{ConfigError, IsoscopeConfig};
pub use crate::data_structures::{load_graphs, Graph, GraphError, GraphRecord, GraphSource};
pub use crate::experiment::{
    RobustnessExperiment, RobustnessReport, ValidationExperiment, ValidationReport,
};
