//! Core algorithm trait definitions for the isoscope analysis engine
//!
//! Every analysis component (centrality, structural hashing, isomorphism
//! verification) exposes the same string-keyed parameter interface so that
//! collaborators can tune it without depending on the concrete config types.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Node identifier ensuring type safety and preventing mixing with other numeric types
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised through the parameter interface
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
}

impl AlgorithmError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parameterised analysis component
///
/// Parameters are exchanged as strings; each implementation validates and
/// stores them in its typed configuration.
pub trait Algorithm {
    /// Returns the component's descriptive name
    fn name(&self) -> &str;

    /// Returns the component's category (e.g. centrality, hashing)
    fn category(&self) -> &str;

    /// Returns a one-paragraph description of what the component computes
    fn description(&self) -> &str;

    /// Sets a parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError>;

    /// Gets a parameter value rendered as a string
    fn get_parameter(&self, name: &str) -> Option<String>;

    /// Returns every supported parameter with its current value
    fn get_parameters(&self) -> HashMap<String, String>;
}

/// Parse a parameter value, mapping failures to [`AlgorithmError::InvalidParameter`]
pub(crate) fn parse_parameter<T>(name: &str, value: &str) -> Result<T, AlgorithmError>
where
    T: FromStr,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AlgorithmError::invalid(name, format!("cannot parse '{}'", value)))
}

/// Parse an optional limit where `none` clears the limit
pub(crate) fn parse_optional_limit(
    name: &str,
    value: &str,
) -> Result<Option<usize>, AlgorithmError> {
    match value.trim() {
        "none" | "" => Ok(None),
        other => {
            let limit: usize = parse_parameter(name, other)?;
            if limit == 0 {
                return Err(AlgorithmError::invalid(name, "must be positive"));
            }
            Ok(Some(limit))
        }
    }
}

pub(crate) fn render_optional_limit(limit: Option<usize>) -> String {
    limit.map_or_else(|| "none".to_string(), |l| l.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_type_safety() {
        let node1 = NodeId(42);
        let node2 = NodeId::from(42);
        let node3 = NodeId(43);

        assert_eq!(node1, node2);
        assert_ne!(node1, node3);
        assert!(node1 < node3);
        assert_eq!(node1.as_usize(), 42);
        assert_eq!(node3.to_string(), "43");
    }

    #[test]
    fn test_parse_parameter() {
        assert_eq!(parse_parameter::<usize>("bins", " 10 ").unwrap(), 10);
        assert!(matches!(
            parse_parameter::<usize>("bins", "ten"),
            Err(AlgorithmError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_optional_limit() {
        assert_eq!(parse_optional_limit("max_states", "none").unwrap(), None);
        assert_eq!(parse_optional_limit("max_states", "500").unwrap(), Some(500));
        assert!(parse_optional_limit("max_states", "0").is_err());
        assert_eq!(render_optional_limit(Some(7)), "7");
        assert_eq!(render_optional_limit(None), "none");
    }
}
