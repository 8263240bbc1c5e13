//! Core types for the loomflow graph engine.
//!
//! This module defines the fundamental types used throughout the crate
//! for identifying nodes and edges and for classifying what a node *is*.
//! These are the domain concepts every other module builds on.
//!
//! # Key Types
//!
//! - [`NodeId`] / [`EdgeId`]: opaque string identifiers
//! - [`NodeType`]: the six processing-node categories that drive
//!   connection legality
//! - [`Provider`]: which model backend a generation-class node targets
//! - [`SearchDepth`]: the discrete retrieval intensity of a context node
//!
//! # Examples
//!
//! ```rust
//! use loomflow::types::{NodeId, NodeType};
//!
//! let id: NodeId = "gen-1".into();
//! assert_eq!(id.as_str(), "gen-1");
//!
//! let kind = NodeType::Generation;
//! assert!(!kind.is_terminal());
//! println!("node kind: {kind}");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque unique identifier of a node within a graph.
///
/// Node ids are assigned by the authoring layer and treated as opaque
/// strings here; uniqueness within a graph is enforced by
/// [`Graph::add_node`](crate::graphs::Graph::add_node).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// View the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// Opaque unique identifier of an edge within a graph.
///
/// Generated by [`Graph::connect`](crate::graphs::Graph::connect) as a
/// UUID, but any unique string supplied by an external snapshot is
/// accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// View the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate a fresh random edge id.
    #[must_use]
    pub fn generate() -> Self {
        EdgeId(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        EdgeId(s.to_owned())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        EdgeId(s)
    }
}

/// Classifies a processing node.
///
/// The node type determines which connections are legal (see
/// [`can_connect`](crate::graphs::can_connect)) and which configuration
/// payload the node carries (see [`NodeConfig`](crate::graphs::NodeConfig)).
///
/// # Examples
///
/// ```rust
/// use loomflow::types::NodeType;
///
/// assert!(NodeType::Context.is_fan_out_exempt());
/// assert!(!NodeType::Generation.is_fan_out_exempt());
/// assert_eq!(NodeType::Ensemble.to_string(), "ensemble");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    /// Free-text entry point. Never accepts incoming edges.
    Input,
    /// Single-model text generation.
    Generation,
    /// Merges the outputs of several upstream branches.
    Ensemble,
    /// Checks and refines an upstream result.
    Validation,
    /// Injects retrieved knowledge-base material into downstream nodes.
    Context,
    /// Terminal sink for the pipeline result. Never originates edges.
    Output,
}

impl NodeType {
    /// All node types, in declaration order.
    pub const ALL: [NodeType; 6] = [
        NodeType::Input,
        NodeType::Generation,
        NodeType::Ensemble,
        NodeType::Validation,
        NodeType::Context,
        NodeType::Output,
    ];

    /// Returns `true` for the types exempt from the single-outgoing-edge
    /// limit (`Input` and `Context` may feed any number of consumers).
    #[must_use]
    pub fn is_fan_out_exempt(self) -> bool {
        matches!(self, NodeType::Input | NodeType::Context)
    }

    /// Returns `true` if this is the terminal [`Output`](Self::Output) type.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeType::Output)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeType::Input => "input",
            NodeType::Generation => "generation",
            NodeType::Ensemble => "ensemble",
            NodeType::Validation => "validation",
            NodeType::Context => "context",
            NodeType::Output => "output",
        };
        write!(f, "{label}")
    }
}

/// Model backend targeted by a generation-class node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    /// A self-hosted or otherwise locally reachable backend.
    Local,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::Local => "local",
        };
        write!(f, "{label}")
    }
}

/// Discrete retrieval intensity of a context node.
///
/// Interpreted by the backend retrieval service; the client only carries
/// it through the run request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Top hits only, cheapest.
    Quick,
    /// Moderate fan-out over the knowledge base.
    #[default]
    Balanced,
    /// Exhaustive retrieval pass.
    Thorough,
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchDepth::Quick => "quick",
            SearchDepth::Balanced => "balanced",
            SearchDepth::Thorough => "thorough",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_wire_form_is_camel_case() {
        let json = serde_json::to_string(&NodeType::Generation).unwrap();
        assert_eq!(json, "\"generation\"");
        let back: NodeType = serde_json::from_str("\"ensemble\"").unwrap();
        assert_eq!(back, NodeType::Ensemble);
    }

    #[test]
    fn node_id_is_transparent_in_json() {
        let id: NodeId = "n1".into();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"n1\"");
    }

    #[test]
    fn fan_out_exemptions() {
        for kind in NodeType::ALL {
            let exempt = matches!(kind, NodeType::Input | NodeType::Context);
            assert_eq!(kind.is_fan_out_exempt(), exempt, "{kind}");
        }
    }
}
