//! Edge records connecting nodes in the authoring graph.

use serde::{Deserialize, Serialize};

use crate::types::{EdgeId, NodeId};

/// A directed connection between two nodes.
///
/// Edges are identified by an opaque unique id and an ordered
/// `(source, target)` pair. Structural invariants (no self-loops, no
/// duplicate pairs, live endpoints) are enforced where edges enter the
/// graph, not here.
///
/// # Examples
///
/// ```rust
/// use loomflow::graphs::Edge;
///
/// let edge = Edge::between("i1", "g1");
/// assert_eq!(edge.source.as_str(), "i1");
/// assert_eq!(edge.target.as_str(), "g1");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    /// Create an edge with an explicit id.
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Create an edge with a freshly generated id.
    pub fn between(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self::new(EdgeId::generate(), source, target)
    }

    /// Returns `true` if this edge connects the given ordered pair.
    #[must_use]
    pub fn connects(&self, source: &NodeId, target: &NodeId) -> bool {
        &self.source == source && &self.target == target
    }

    /// Returns `true` if either endpoint is the given node.
    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}
