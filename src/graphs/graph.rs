//! The authoring graph: node set plus edge set, with structural
//! bookkeeping.
//!
//! [`Graph`] owns the invariants that must hold at every moment while the
//! user edits — unique node ids, at most one `Output`, no dangling or
//! duplicated edges — and cascades edge removal when a node goes away.
//! Type-level connection legality lives in [`can_connect`](super::can_connect);
//! whole-graph completeness lives in [`validate_graph`](super::validate_graph).

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::connect::{ConnectRejection, can_connect};
use super::edge::Edge;
use super::node::{GraphNode, NodeConfig};
use crate::types::{EdgeId, NodeId, NodeType};

/// Structural mutation failures.
///
/// Every rule violation is reported as data; nothing here panics. The
/// authoring layer surfaces the `Display` text directly.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("a node with id '{id}' already exists")]
    #[diagnostic(code(loomflow::graph::duplicate_node))]
    DuplicateNode { id: NodeId },

    #[error("no node with id '{id}' exists")]
    #[diagnostic(code(loomflow::graph::unknown_node))]
    UnknownNode { id: NodeId },

    #[error("no edge with id '{id}' exists")]
    #[diagnostic(code(loomflow::graph::unknown_edge))]
    UnknownEdge { id: EdgeId },

    #[error("graph already has an output node ('{existing}')")]
    #[diagnostic(
        code(loomflow::graph::second_output),
        help("A graph may hold at most one output node.")
    )]
    SecondOutput { existing: NodeId },

    #[error("the output node '{id}' cannot be removed")]
    #[diagnostic(code(loomflow::graph::output_undeletable))]
    OutputUndeletable { id: NodeId },

    #[error("'{id}' is the last input node and cannot be removed")]
    #[diagnostic(
        code(loomflow::graph::last_input),
        help("A graph must always keep at least one input node.")
    )]
    LastInput { id: NodeId },

    #[error("node '{id}' is a {current} node; its configuration cannot change it to {proposed}")]
    #[diagnostic(code(loomflow::graph::type_change))]
    TypeChange {
        id: NodeId,
        current: NodeType,
        proposed: NodeType,
    },

    #[error("edge '{source_id}' -> '{target}' would be a self-loop")]
    #[diagnostic(code(loomflow::graph::edge_self_loop))]
    EdgeSelfLoop { source_id: NodeId, target: NodeId },

    #[error("an edge '{source_id}' -> '{target}' already exists")]
    #[diagnostic(code(loomflow::graph::edge_duplicate))]
    EdgeDuplicate { source_id: NodeId, target: NodeId },

    #[error("edge endpoint '{id}' does not exist in the graph")]
    #[diagnostic(code(loomflow::graph::edge_endpoint_missing))]
    EdgeEndpointMissing { id: NodeId },
}

/// A point-in-time graph of typed processing nodes.
///
/// Owned by the authoring layer; the validator and the run request
/// serializer treat it as an immutable snapshot.
///
/// # Examples
///
/// ```rust
/// use loomflow::graphs::{Graph, GraphNode};
/// use loomflow::types::Provider;
///
/// let mut graph = Graph::new();
/// graph.add_node(GraphNode::input("i1", "hello")).unwrap();
/// graph.add_node(GraphNode::generation("g1", "gpt-4o", Provider::OpenAi, "{input}")).unwrap();
/// graph.add_node(GraphNode::output("o1")).unwrap();
///
/// graph.connect(&"i1".into(), &"g1".into()).unwrap();
/// graph.connect(&"g1".into(), &"o1".into()).unwrap();
///
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphSnapshot")]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: FxHashMap<NodeId, usize>,
}

/// Wire shape of a serialized graph: just the node and edge lists.
#[derive(Deserialize)]
struct GraphSnapshot {
    nodes: Vec<GraphNode>,
    edges: Vec<Edge>,
}

impl TryFrom<GraphSnapshot> for Graph {
    type Error = GraphError;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        Graph::from_parts(snapshot.nodes, snapshot.edges)
    }
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the id index after a positional removal.
    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
    }

    /// Assemble a graph from an externally produced snapshot.
    ///
    /// Only the moment-to-moment structural invariants are enforced
    /// (unique node ids, one output, well-formed edges); run
    /// [`validate_graph`](super::validate_graph) before executing.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = GraphNode>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Returns `true` if a node with this id exists.
    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    /// Ids of all nodes, in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Look up an edge by id.
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Returns `true` if an edge with this exact ordered pair exists.
    #[must_use]
    pub fn has_edge_between(&self, source: &NodeId, target: &NodeId) -> bool {
        self.edges.iter().any(|e| e.connects(source, target))
    }

    /// Edges originating at the given node.
    pub fn edges_from<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// Edges terminating at the given node.
    pub fn edges_into<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    /// The graph's output node, if one exists.
    #[must_use]
    pub fn output_node(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.node_type() == NodeType::Output)
    }

    /// How many nodes of the given type exist.
    #[must_use]
    pub fn count_of_type(&self, kind: NodeType) -> usize {
        self.nodes.iter().filter(|n| n.node_type() == kind).count()
    }

    /// Add a node.
    ///
    /// Rejects a duplicate id and a second `Output` node.
    pub fn add_node(&mut self, node: GraphNode) -> Result<(), GraphError> {
        if self.contains_node(&node.id) {
            return Err(GraphError::DuplicateNode { id: node.id });
        }
        if node.node_type() == NodeType::Output
            && let Some(existing) = self.output_node()
        {
            return Err(GraphError::SecondOutput {
                existing: existing.id.clone(),
            });
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node, cascading removal of every incident edge.
    ///
    /// The `Output` node can never be removed, and the last remaining
    /// `Input` node must stay.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<GraphNode, GraphError> {
        let Some(node) = self.node(id) else {
            return Err(GraphError::UnknownNode { id: id.clone() });
        };
        match node.node_type() {
            NodeType::Output => {
                return Err(GraphError::OutputUndeletable { id: id.clone() });
            }
            NodeType::Input if self.count_of_type(NodeType::Input) == 1 => {
                return Err(GraphError::LastInput { id: id.clone() });
            }
            _ => {}
        }
        let slot = self.index[id];
        let removed = self.nodes.remove(slot);
        self.edges.retain(|e| !e.touches(id));
        self.reindex();
        Ok(removed)
    }

    /// Replace a node's configuration.
    ///
    /// Configuration edits may not change the node's type; the authoring
    /// layer creates a new node for that.
    pub fn update_config(&mut self, id: &NodeId, config: NodeConfig) -> Result<(), GraphError> {
        let Some(&slot) = self.index.get(id) else {
            return Err(GraphError::UnknownNode { id: id.clone() });
        };
        let current = self.nodes[slot].node_type();
        if current != config.node_type() {
            return Err(GraphError::TypeChange {
                id: id.clone(),
                current,
                proposed: config.node_type(),
            });
        }
        self.nodes[slot].config = config;
        Ok(())
    }

    /// Move a node on the canvas. Layout only; never affects validation.
    pub fn set_position(&mut self, id: &NodeId, x: f64, y: f64) -> Result<(), GraphError> {
        let Some(&slot) = self.index.get(id) else {
            return Err(GraphError::UnknownNode { id: id.clone() });
        };
        self.nodes[slot].position = super::node::Position::new(x, y);
        Ok(())
    }

    /// Connect two nodes, gated by the full connection rules.
    ///
    /// On success the new edge's generated id is returned. On rejection
    /// the graph is untouched and the single human-readable reason is the
    /// rejection's `Display`.
    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
    ) -> Result<EdgeId, ConnectRejection> {
        can_connect(source, target, self)?;
        let edge = Edge::between(source.clone(), target.clone());
        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(id)
    }

    /// Insert an edge from an external snapshot.
    ///
    /// Enforces only the structural edge invariants (live endpoints, no
    /// self-loop, no duplicate ordered pair) — not the type rules. Used
    /// when reassembling a graph the authoring layer already gated.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !self.contains_node(&edge.source) {
            return Err(GraphError::EdgeEndpointMissing { id: edge.source });
        }
        if !self.contains_node(&edge.target) {
            return Err(GraphError::EdgeEndpointMissing { id: edge.target });
        }
        if edge.source == edge.target {
            return Err(GraphError::EdgeSelfLoop {
                source_id: edge.source,
                target: edge.target,
            });
        }
        if self.has_edge_between(&edge.source, &edge.target) {
            return Err(GraphError::EdgeDuplicate {
                source_id: edge.source,
                target: edge.target,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Remove a single edge by id.
    pub fn disconnect(&mut self, id: &EdgeId) -> Result<Edge, GraphError> {
        let Some(slot) = self.edges.iter().position(|e| &e.id == id) else {
            return Err(GraphError::UnknownEdge { id: id.clone() });
        };
        Ok(self.edges.remove(slot))
    }
}
