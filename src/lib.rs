//! # Loomflow: Node-Graph Authoring and Streaming Execution Client
//!
//! Loomflow is the client-side engine behind a visual LLM pipeline
//! builder: it decides which node-to-node connections are legal while the
//! user edits, audits the whole graph before a run may start, and folds
//! the backend's streaming event protocol into a consistent per-node and
//! whole-run execution state.
//!
//! ## Core Concepts
//!
//! - **Nodes**: typed processing steps (`input`, `generation`,
//!   `ensemble`, `validation`, `context`, `output`), each carrying only
//!   its own configuration fields
//! - **Gating**: every proposed edge passes [`graphs::can_connect`]
//!   before it enters the graph
//! - **Audit**: [`graphs::validate_graph`] re-derives adjacency and
//!   reports every completeness violation at once
//! - **Streaming**: a [`runtimes::Transport`] decodes newline-framed
//!   protocol records; [`runtimes::StreamReducer`] applies them one at a
//!   time to the [`runtimes::ExecutionStateStore`]
//!
//! ## Quick Start
//!
//! ### Authoring a graph
//!
//! ```
//! use loomflow::graphs::{Graph, GraphNode, validate_graph};
//! use loomflow::types::{Provider, SearchDepth};
//!
//! let mut graph = Graph::new();
//! graph.add_node(GraphNode::input("i1", "Explain lifetimes")).unwrap();
//! graph.add_node(GraphNode::context("c1", "rust-book", SearchDepth::Balanced)).unwrap();
//! graph.add_node(GraphNode::generation(
//!     "g1", "claude-sonnet-4-5", Provider::Anthropic, "{input}",
//! )).unwrap();
//! graph.add_node(GraphNode::output("o1")).unwrap();
//!
//! graph.connect(&"i1".into(), &"g1".into()).unwrap();
//! graph.connect(&"c1".into(), &"g1".into()).unwrap();
//! graph.connect(&"g1".into(), &"o1".into()).unwrap();
//!
//! assert!(validate_graph(&graph).is_valid());
//! ```
//!
//! ### Rejections are data
//!
//! ```
//! use loomflow::graphs::{Graph, GraphNode, can_connect};
//! use loomflow::types::Provider;
//!
//! let mut graph = Graph::new();
//! graph.add_node(GraphNode::input("i1", "seed")).unwrap();
//! graph.add_node(GraphNode::generation("g1", "m", Provider::Local, "p")).unwrap();
//! graph.add_node(GraphNode::output("o1")).unwrap();
//!
//! // Output can never originate a connection; the reason is a value,
//! // not an exception.
//! let rejection = can_connect(&"o1".into(), &"g1".into(), &graph).unwrap_err();
//! assert_eq!(rejection.to_string(), "the output node cannot be a connection source");
//! ```
//!
//! ### Folding a run's event stream
//!
//! ```
//! use loomflow::runtimes::{ExecutionStateStore, NodeReport, RunEvent, StreamReducer};
//!
//! let mut store = ExecutionStateStore::new();
//! let mut reducer = StreamReducer::new(vec!["g1".into()]);
//!
//! for event in [
//!     RunEvent::run_start("exec-1"),
//!     RunEvent::node_start("g1"),
//!     RunEvent::streaming("g1", "ab"),
//!     RunEvent::streaming("g1", "cd"),
//!     RunEvent::node_complete("g1", NodeReport::success("abcd")),
//! ] {
//!     reducer.apply(&mut store, event);
//! }
//!
//! assert_eq!(store.node(&"g1".into()).unwrap().buffer, "abcd");
//! ```
//!
//! ## Module Guide
//!
//! - [`types`] - Node/edge identifiers and the core domain enums
//! - [`graphs`] - Graph model, connection gating, whole-graph audit
//! - [`runtimes`] - Protocol events, execution state store, stream
//!   reducer, transport, run session
//! - [`telemetry`] - Event line rendering and tracing setup

pub mod graphs;
pub mod runtimes;
pub mod telemetry;
pub mod types;
