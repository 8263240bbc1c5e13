//! Whole-graph audit run immediately before execution.
//!
//! Per-edge gating keeps illegal edges out, but only a full pass can see
//! what is *missing*: unconnected nodes, absent inputs, a run with no
//! terminal. [`validate_graph`] re-derives adjacency from the edge set —
//! deliberately not trusting any incrementally maintained counts — and
//! appends one [`GraphIssue`] per violated rule instead of stopping at
//! the first, so the authoring layer can show the complete list at once.

use thiserror::Error;

use super::adjacency::DegreeIndex;
use super::graph::Graph;
use crate::types::{EdgeId, NodeId, NodeType};

/// A single violated completeness rule.
///
/// The `Display` text is the human-readable error shown in the UI; every
/// variant names the node (or edge) it concerns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    #[error("graph needs at least one input node")]
    NoInput,

    #[error("graph has {count} output nodes; at most one is allowed")]
    MultipleOutputs { count: usize },

    #[error("edge '{edge}' references missing node '{endpoint}'")]
    DanglingEdge { edge: EdgeId, endpoint: NodeId },

    #[error("input node '{id}' must not receive connections ({count} found)")]
    InputHasIncoming { id: NodeId, count: usize },

    #[error("{kind} node '{id}' is not connected to anything downstream")]
    NoOutgoing { id: NodeId, kind: NodeType },

    #[error("{kind} node '{id}' has no incoming connection")]
    NoIncoming { id: NodeId, kind: NodeType },

    #[error("generation node '{id}' draws from {count} input nodes; only one is allowed")]
    GenerationTooManyInputs { id: NodeId, count: usize },

    #[error("generation node '{id}' can only draw from an input node and context nodes")]
    GenerationForeignSource { id: NodeId },

    #[error("{kind} node '{id}' has {count} non-context sources; only one is allowed")]
    ExcessNonContextSources {
        id: NodeId,
        kind: NodeType,
        count: usize,
    },

    #[error("validation node '{id}' cannot draw from the output node")]
    ValidationFromOutput { id: NodeId },

    #[error("{kind} node '{id}' has {count} outgoing connections; only one is allowed")]
    FanOutExceeded {
        id: NodeId,
        kind: NodeType,
        count: usize,
    },

    #[error("output node '{id}' must not have outgoing connections ({count} found)")]
    OutputHasOutgoing { id: NodeId, count: usize },
}

/// Outcome of a whole-graph audit.
///
/// # Examples
///
/// ```rust
/// use loomflow::graphs::{Graph, GraphNode, validate_graph};
/// use loomflow::types::Provider;
///
/// let mut graph = Graph::new();
/// graph.add_node(GraphNode::input("i1", "q")).unwrap();
/// graph.add_node(GraphNode::generation("g1", "m", Provider::Local, "p")).unwrap();
/// graph.add_node(GraphNode::output("o1")).unwrap();
/// graph.connect(&"i1".into(), &"g1".into()).unwrap();
/// graph.connect(&"g1".into(), &"o1".into()).unwrap();
///
/// let audit = validate_graph(&graph);
/// assert!(audit.is_valid());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphAudit {
    issues: Vec<GraphIssue>,
}

impl GraphAudit {
    /// `true` when no rule was violated and execution may start.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// The violated rules, in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[GraphIssue] {
        &self.issues
    }

    /// The human-readable error list for display.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Audit a graph snapshot against every per-type completeness rule.
///
/// Builds a [`DegreeIndex`] once and reads all per-node counts from it.
/// Never short-circuits: every violated rule appends its own issue.
#[must_use]
pub fn validate_graph(graph: &Graph) -> GraphAudit {
    let mut issues = Vec::new();

    if graph.count_of_type(NodeType::Input) == 0 {
        issues.push(GraphIssue::NoInput);
    }
    let outputs = graph.count_of_type(NodeType::Output);
    if outputs > 1 {
        issues.push(GraphIssue::MultipleOutputs { count: outputs });
    }

    // An externally supplied snapshot may not have gone through the gate;
    // report edges whose endpoints are gone before reading any counts.
    for edge in graph.edges() {
        for endpoint in [&edge.source, &edge.target] {
            if !graph.contains_node(endpoint) {
                issues.push(GraphIssue::DanglingEdge {
                    edge: edge.id.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
    }

    let index = DegreeIndex::build(graph);

    for node in graph.nodes() {
        let kind = node.node_type();
        let d = index.degrees(&node.id);

        match kind {
            NodeType::Input => {
                if d.total_incoming() > 0 {
                    issues.push(GraphIssue::InputHasIncoming {
                        id: node.id.clone(),
                        count: d.total_incoming(),
                    });
                }
                if d.outgoing == 0 {
                    issues.push(GraphIssue::NoOutgoing {
                        id: node.id.clone(),
                        kind,
                    });
                }
            }
            NodeType::Generation => {
                if d.total_incoming() == 0 {
                    issues.push(GraphIssue::NoIncoming {
                        id: node.id.clone(),
                        kind,
                    });
                }
                if d.incoming_input > 1 {
                    issues.push(GraphIssue::GenerationTooManyInputs {
                        id: node.id.clone(),
                        count: d.incoming_input,
                    });
                }
                if d.incoming_other > 0 {
                    issues.push(GraphIssue::GenerationForeignSource {
                        id: node.id.clone(),
                    });
                }
                if d.outgoing == 0 {
                    issues.push(GraphIssue::NoOutgoing {
                        id: node.id.clone(),
                        kind,
                    });
                }
            }
            NodeType::Ensemble => {
                if d.total_incoming() == 0 {
                    issues.push(GraphIssue::NoIncoming {
                        id: node.id.clone(),
                        kind,
                    });
                }
                if d.outgoing == 0 {
                    issues.push(GraphIssue::NoOutgoing {
                        id: node.id.clone(),
                        kind,
                    });
                }
            }
            NodeType::Validation => {
                if d.total_incoming() == 0 {
                    issues.push(GraphIssue::NoIncoming {
                        id: node.id.clone(),
                        kind,
                    });
                }
                if d.non_context_incoming() > 1 {
                    issues.push(GraphIssue::ExcessNonContextSources {
                        id: node.id.clone(),
                        kind,
                        count: d.non_context_incoming(),
                    });
                }
                if d.incoming_from_output > 0 {
                    issues.push(GraphIssue::ValidationFromOutput {
                        id: node.id.clone(),
                    });
                }
                if d.outgoing == 0 {
                    issues.push(GraphIssue::NoOutgoing {
                        id: node.id.clone(),
                        kind,
                    });
                }
            }
            NodeType::Context => {
                // Incoming is optional for context nodes, but the
                // non-context cap still binds on unguarded snapshots.
                if d.non_context_incoming() > 1 {
                    issues.push(GraphIssue::ExcessNonContextSources {
                        id: node.id.clone(),
                        kind,
                        count: d.non_context_incoming(),
                    });
                }
                if d.outgoing == 0 {
                    issues.push(GraphIssue::NoOutgoing {
                        id: node.id.clone(),
                        kind,
                    });
                }
            }
            NodeType::Output => {
                if d.total_incoming() == 0 {
                    issues.push(GraphIssue::NoIncoming {
                        id: node.id.clone(),
                        kind,
                    });
                }
                if d.outgoing > 0 {
                    issues.push(GraphIssue::OutputHasOutgoing {
                        id: node.id.clone(),
                        count: d.outgoing,
                    });
                }
            }
        }

        if !kind.is_fan_out_exempt() && kind != NodeType::Output && d.outgoing > 1 {
            issues.push(GraphIssue::FanOutExceeded {
                id: node.id.clone(),
                kind,
                count: d.outgoing,
            });
        }
    }

    GraphAudit { issues }
}
