//! Interactive connection gating.
//!
//! [`can_connect`] is the pure check run while the user drags a new edge:
//! it either clears the proposed connection or names the first rule it
//! breaks. The checks run in a fixed order so the reason shown to the
//! user is always the most fundamental one.

use miette::Diagnostic;
use thiserror::Error;

use super::graph::Graph;
use crate::types::{NodeId, NodeType};

/// Why a proposed connection was refused.
///
/// The `Display` text is the single reason string surfaced next to the
/// rejected drag; the variants let callers branch without string matching.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ConnectRejection {
    #[error("no node with id '{id}' exists")]
    #[diagnostic(code(loomflow::connect::unknown_node))]
    UnknownNode { id: NodeId },

    #[error("a node cannot connect to itself")]
    #[diagnostic(code(loomflow::connect::self_loop))]
    SelfLoop,

    #[error("these nodes are already connected")]
    #[diagnostic(code(loomflow::connect::duplicate))]
    DuplicateEdge,

    #[error("input nodes cannot receive connections")]
    #[diagnostic(code(loomflow::connect::input_target))]
    InputTarget,

    #[error("the output node cannot be a connection source")]
    #[diagnostic(code(loomflow::connect::output_source))]
    OutputSource,

    #[error("a {source_kind} node cannot feed a {target} node")]
    #[diagnostic(code(loomflow::connect::incompatible))]
    IncompatibleTypes {
        source_kind: NodeType,
        target: NodeType,
    },

    #[error("a {source_kind} node can only have one outgoing connection")]
    #[diagnostic(
        code(loomflow::connect::source_exhausted),
        help("Only input and context nodes may fan out.")
    )]
    SourceExhausted { source_kind: NodeType },

    #[error("this {target} node already has its maximum of one non-context source")]
    #[diagnostic(code(loomflow::connect::target_saturated))]
    TargetSaturated { target: NodeType },
}

/// The type-compatibility matrix: may `source` feed `target` at all?
///
/// Degree limits are checked separately; this is purely about the pair of
/// types.
#[must_use]
pub fn types_compatible(source: NodeType, target: NodeType) -> bool {
    use NodeType::*;
    match source {
        Input => matches!(target, Generation | Ensemble | Validation | Context | Output),
        Generation => matches!(target, Ensemble | Validation | Output),
        Ensemble => matches!(target, Validation | Ensemble | Output),
        Validation => matches!(target, Validation | Ensemble | Output),
        Context => matches!(target, Generation | Ensemble | Validation | Context | Output),
        Output => false,
    }
}

/// Gate a single proposed edge.
///
/// Pure: reads the graph, mutates nothing. Checks run in order and stop
/// at the first failure:
///
/// 1. both endpoints exist,
/// 2. no self-connection,
/// 3. no duplicate ordered pair,
/// 4. `Input` never a target, `Output` never a source,
/// 5. the type-compatibility matrix,
/// 6. the source's outgoing limit (one, unless `Input`/`Context`),
/// 7. the target's non-context incoming limit.
///
/// # Examples
///
/// ```rust
/// use loomflow::graphs::{Graph, GraphNode, can_connect, ConnectRejection};
/// use loomflow::types::Provider;
///
/// let mut graph = Graph::new();
/// graph.add_node(GraphNode::input("i1", "seed")).unwrap();
/// graph.add_node(GraphNode::generation("g1", "m", Provider::Local, "p")).unwrap();
///
/// assert!(can_connect(&"i1".into(), &"g1".into(), &graph).is_ok());
/// assert_eq!(
///     can_connect(&"g1".into(), &"g1".into(), &graph),
///     Err(ConnectRejection::SelfLoop),
/// );
/// ```
pub fn can_connect(
    source: &NodeId,
    target: &NodeId,
    graph: &Graph,
) -> Result<(), ConnectRejection> {
    let source_node = graph
        .node(source)
        .ok_or_else(|| ConnectRejection::UnknownNode { id: source.clone() })?;
    let target_node = graph
        .node(target)
        .ok_or_else(|| ConnectRejection::UnknownNode { id: target.clone() })?;

    if source == target {
        return Err(ConnectRejection::SelfLoop);
    }
    if graph.has_edge_between(source, target) {
        return Err(ConnectRejection::DuplicateEdge);
    }

    let source_type = source_node.node_type();
    let target_type = target_node.node_type();

    if target_type == NodeType::Input {
        return Err(ConnectRejection::InputTarget);
    }
    if source_type == NodeType::Output {
        return Err(ConnectRejection::OutputSource);
    }
    if !types_compatible(source_type, target_type) {
        return Err(ConnectRejection::IncompatibleTypes {
            source_kind: source_type,
            target: target_type,
        });
    }

    if !source_type.is_fan_out_exempt() && graph.edges_from(source).count() >= 1 {
        return Err(ConnectRejection::SourceExhausted {
            source_kind: source_type,
        });
    }

    // Incoming limits only bind the non-Context sources; Context fan-in is
    // always free.
    if source_type != NodeType::Context {
        let non_context_incoming = graph
            .edges_into(target)
            .filter(|e| {
                graph
                    .node(&e.source)
                    .is_some_and(|n| n.node_type() != NodeType::Context)
            })
            .count();

        let saturated = match target_type {
            NodeType::Ensemble | NodeType::Output => false,
            // Generation and Validation take exactly one non-context
            // source; so does every type not named above.
            _ => non_context_incoming >= 1,
        };
        if saturated {
            return Err(ConnectRejection::TargetSaturated {
                target: target_type,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::GraphNode;
    use crate::types::{Provider, SearchDepth};

    fn graph() -> Graph {
        let mut g = Graph::new();
        g.add_node(GraphNode::input("i1", "seed")).unwrap();
        g.add_node(GraphNode::input("i2", "seed2")).unwrap();
        g.add_node(GraphNode::generation("g1", "m", Provider::OpenAi, "p"))
            .unwrap();
        g.add_node(GraphNode::generation("g2", "m", Provider::OpenAi, "p"))
            .unwrap();
        g.add_node(GraphNode::ensemble("e1", "m", Provider::OpenAi, "p"))
            .unwrap();
        g.add_node(GraphNode::validation("v1", "m", Provider::OpenAi, "p"))
            .unwrap();
        g.add_node(GraphNode::context("c1", "kb", SearchDepth::Quick))
            .unwrap();
        g.add_node(GraphNode::output("o1")).unwrap();
        g
    }

    fn check(g: &Graph, s: &str, t: &str) -> Result<(), ConnectRejection> {
        can_connect(&s.into(), &t.into(), g)
    }

    #[test]
    fn output_cannot_source() {
        let g = graph();
        assert_eq!(check(&g, "o1", "g1"), Err(ConnectRejection::OutputSource));
    }

    #[test]
    fn input_cannot_be_target() {
        let g = graph();
        assert_eq!(check(&g, "g1", "i1"), Err(ConnectRejection::InputTarget));
    }

    #[test]
    fn duplicate_pair_rejected() {
        let mut g = graph();
        g.connect(&"i1".into(), &"g1".into()).unwrap();
        assert_eq!(check(&g, "i1", "g1"), Err(ConnectRejection::DuplicateEdge));
    }

    #[test]
    fn generation_cannot_feed_generation() {
        let g = graph();
        assert_eq!(
            check(&g, "g1", "g2"),
            Err(ConnectRejection::IncompatibleTypes {
                source_kind: NodeType::Generation,
                target: NodeType::Generation,
            })
        );
    }

    #[test]
    fn generation_fan_out_is_limited_to_one() {
        let mut g = graph();
        g.connect(&"g1".into(), &"e1".into()).unwrap();
        assert_eq!(
            check(&g, "g1", "o1"),
            Err(ConnectRejection::SourceExhausted {
                source_kind: NodeType::Generation,
            })
        );
    }

    #[test]
    fn input_and_context_may_fan_out() {
        let mut g = graph();
        g.connect(&"i1".into(), &"g1".into()).unwrap();
        assert!(check(&g, "i1", "e1").is_ok());
        g.connect(&"c1".into(), &"g1".into()).unwrap();
        assert!(check(&g, "c1", "e1").is_ok());
    }

    #[test]
    fn generation_accepts_one_input_plus_contexts() {
        let mut g = graph();
        g.connect(&"i1".into(), &"g1".into()).unwrap();
        // Second non-context source refused, context still welcome.
        assert_eq!(
            check(&g, "i2", "g1"),
            Err(ConnectRejection::TargetSaturated {
                target: NodeType::Generation,
            })
        );
        assert!(check(&g, "c1", "g1").is_ok());
    }

    #[test]
    fn validation_takes_one_non_context_source() {
        let mut g = graph();
        g.connect(&"g1".into(), &"v1".into()).unwrap();
        assert_eq!(
            check(&g, "g2", "v1"),
            Err(ConnectRejection::TargetSaturated {
                target: NodeType::Validation,
            })
        );
    }

    #[test]
    fn ensemble_and_output_fan_in_unbounded() {
        let mut g = graph();
        g.connect(&"i1".into(), &"e1".into()).unwrap();
        g.connect(&"i2".into(), &"e1".into()).unwrap();
        g.connect(&"g1".into(), &"e1".into()).unwrap();
        assert!(check(&g, "g2", "e1").is_ok());

        g.connect(&"i1".into(), &"o1".into()).unwrap();
        assert!(check(&g, "i2", "o1").is_ok());
    }

    #[test]
    fn context_chains_allow_one_input_source() {
        let mut g = graph();
        g.add_node(GraphNode::context("c2", "kb2", SearchDepth::Quick))
            .unwrap();
        g.connect(&"i1".into(), &"c1".into()).unwrap();
        // Context target: one non-context source max.
        assert_eq!(
            check(&g, "i2", "c1"),
            Err(ConnectRejection::TargetSaturated {
                target: NodeType::Context,
            })
        );
        // Context -> Context stays open.
        assert!(check(&g, "c2", "c1").is_ok());
    }
}
