//! Typed configuration for the analysis pipeline
//!
//! Every struct has a `Default` matching the reference experiments and can be
//! deserialized from JSON (missing fields fall back to their defaults).
//! Components also accept the same values through
//! [`Algorithm::set_parameter`](crate::algorithm::traits::Algorithm::set_parameter).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Structural hasher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Number of equal-width centrality bins used to seed colors
    pub bins: usize,
    /// Optional cap on refinement rounds (node count is always a cap)
    pub max_rounds: Option<usize>,
    /// Run per-source centrality passes and per-graph hashing on rayon
    pub parallel: bool,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            bins: 10,
            max_rounds: None,
            parallel: true,
        }
    }
}

/// Isomorphism verifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Exact-search state budget; `None` searches without bound
    pub max_states: Option<usize>,
    /// Absolute and relative tolerance for eigenvalue comparison (0 = exact)
    pub eigenvalue_tolerance: f64,
    /// Convergence threshold handed to the symmetric eigensolver
    pub eigen_epsilon: f64,
    /// Iteration cap for the eigensolver; exhausting it yields an empty spectrum
    pub eigen_max_iterations: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_states: Some(1_000_000),
            eigenvalue_tolerance: 1e-9,
            eigen_epsilon: f64::EPSILON,
            eigen_max_iterations: 10_000,
        }
    }
}

/// Perturbation robustness experiment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobustnessConfig {
    pub perturbations_per_graph: usize,
    /// Seed for the experiment's ChaCha20 generator
    pub seed: u64,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            perturbations_per_graph: 1,
            seed: 42,
        }
    }
}

/// Hash-group validation experiment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// How many of the largest groups to analyse
    pub groups_to_analyze: usize,
    /// Confirmed mappings kept per group
    pub max_retained_mappings: usize,
    /// Refuted pairs kept with their full verdict per group
    pub max_detailed_pairs: usize,
    /// Verify the pairs of a group on rayon
    pub parallel: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            groups_to_analyze: 2,
            max_retained_mappings: 3,
            max_detailed_pairs: 5,
            parallel: true,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoscopeConfig {
    pub hasher: HasherConfig,
    pub verifier: VerifierConfig,
    pub robustness: RobustnessConfig,
    pub validation: ValidationConfig,
}

impl IsoscopeConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: IsoscopeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hasher.bins == 0 {
            return Err(ConfigError::Invalid {
                field: "hasher.bins",
                reason: "must be positive".to_string(),
            });
        }
        if self.hasher.max_rounds == Some(0) {
            return Err(ConfigError::Invalid {
                field: "hasher.max_rounds",
                reason: "must be positive when set".to_string(),
            });
        }
        if self.verifier.max_states == Some(0) {
            return Err(ConfigError::Invalid {
                field: "verifier.max_states",
                reason: "must be positive when set".to_string(),
            });
        }
        if !(self.verifier.eigenvalue_tolerance >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "verifier.eigenvalue_tolerance",
                reason: format!(
                    "{} is not a non-negative number",
                    self.verifier.eigenvalue_tolerance
                ),
            });
        }
        if !(self.verifier.eigen_epsilon > 0.0) {
            return Err(ConfigError::Invalid {
                field: "verifier.eigen_epsilon",
                reason: format!("{} is not a positive number", self.verifier.eigen_epsilon),
            });
        }
        Ok(())
    }
}
