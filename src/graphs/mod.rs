//! Graph model and connection constraint engine.
//!
//! This module owns everything that happens before a run starts: the
//! in-memory [`Graph`] of typed processing nodes, the interactive
//! [`can_connect`] gate applied while the user drags a new edge, and the
//! pre-run [`validate_graph`] audit that checks whole-graph completeness.
//!
//! # Core Concepts
//!
//! - **Nodes**: [`GraphNode`] records whose [`NodeConfig`] payload is a
//!   tagged variant keyed by node type
//! - **Edges**: ordered, uniquely identified [`Edge`] pairs
//! - **Gating**: per-edge legality decided by [`can_connect`] before an
//!   edge ever enters the graph
//! - **Audit**: [`validate_graph`] re-derives adjacency into a
//!   [`DegreeIndex`] and reports every violation at once
//!
//! # Example
//!
//! ```rust
//! use loomflow::graphs::{Graph, GraphNode, validate_graph};
//! use loomflow::types::{Provider, SearchDepth};
//!
//! let mut graph = Graph::new();
//! graph.add_node(GraphNode::input("i1", "What is ownership?")).unwrap();
//! graph.add_node(GraphNode::context("c1", "rust-book", SearchDepth::Balanced)).unwrap();
//! graph.add_node(GraphNode::generation("g1", "claude-sonnet-4-5", Provider::Anthropic, "{input}")).unwrap();
//! graph.add_node(GraphNode::output("o1")).unwrap();
//!
//! graph.connect(&"i1".into(), &"g1".into()).unwrap();
//! graph.connect(&"c1".into(), &"g1".into()).unwrap();
//! graph.connect(&"g1".into(), &"o1".into()).unwrap();
//!
//! assert!(validate_graph(&graph).is_valid());
//! ```

mod adjacency;
mod audit;
mod connect;
mod edge;
mod graph;
mod node;

pub use adjacency::{DegreeIndex, NodeDegrees};
pub use audit::{GraphAudit, GraphIssue, validate_graph};
pub use connect::{ConnectRejection, can_connect, types_compatible};
pub use edge::Edge;
pub use graph::{Graph, GraphError};
pub use node::{GraphNode, ModelSpec, NodeConfig, Position};
