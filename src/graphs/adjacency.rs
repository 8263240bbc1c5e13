//! One-pass degree index over a graph snapshot.
//!
//! The whole-graph audit re-derives adjacency from the edge set instead of
//! trusting incrementally maintained state. [`DegreeIndex`] is that single
//! derivation: one walk over the edges, after which every per-node check
//! reads counts in O(1).

use rustc_hash::FxHashMap;

use super::graph::Graph;
use crate::types::{NodeId, NodeType};

/// Incoming/outgoing degree counts for one node, with incoming edges
/// partitioned by the buckets the connection rules care about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeDegrees {
    /// Incoming edges whose source is a `Context` node (never limited).
    pub incoming_context: usize,
    /// Incoming edges whose source is an `Input` node.
    pub incoming_input: usize,
    /// Incoming edges from any other node type.
    pub incoming_other: usize,
    /// Of `incoming_other`, how many originate at an `Output` node.
    /// Always zero for a gated graph; audited anyway.
    pub incoming_from_output: usize,
    /// Outgoing edge count.
    pub outgoing: usize,
}

impl NodeDegrees {
    /// Incoming edges that count against the non-Context limits.
    #[must_use]
    pub fn non_context_incoming(&self) -> usize {
        self.incoming_input + self.incoming_other
    }

    /// Total incoming edge count.
    #[must_use]
    pub fn total_incoming(&self) -> usize {
        self.incoming_context + self.non_context_incoming()
    }
}

/// Degree counts for every node in a snapshot.
///
/// Built in one pass by [`DegreeIndex::build`]; edges whose endpoints are
/// missing from the node set are skipped here (the audit reports them
/// separately).
#[derive(Clone, Debug, Default)]
pub struct DegreeIndex {
    degrees: FxHashMap<NodeId, NodeDegrees>,
}

impl DegreeIndex {
    /// Derive the index from the graph's edge set.
    #[must_use]
    pub fn build(graph: &Graph) -> Self {
        let mut degrees: FxHashMap<NodeId, NodeDegrees> = graph
            .node_ids()
            .map(|id| (id.clone(), NodeDegrees::default()))
            .collect();

        for edge in graph.edges() {
            if !graph.contains_node(&edge.target) {
                continue;
            }
            let Some(source) = graph.node(&edge.source) else {
                continue;
            };
            let source_type = source.node_type();

            if let Some(out) = degrees.get_mut(&edge.source) {
                out.outgoing += 1;
            }
            if let Some(inc) = degrees.get_mut(&edge.target) {
                match source_type {
                    NodeType::Context => inc.incoming_context += 1,
                    NodeType::Input => inc.incoming_input += 1,
                    other => {
                        inc.incoming_other += 1;
                        if other == NodeType::Output {
                            inc.incoming_from_output += 1;
                        }
                    }
                }
            }
        }

        Self { degrees }
    }

    /// Degree counts for one node. Zeroed counts for an unknown id.
    #[must_use]
    pub fn degrees(&self, id: &NodeId) -> NodeDegrees {
        self.degrees.get(id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::{Edge, GraphNode};
    use crate::types::{Provider, SearchDepth};

    #[test]
    fn partitions_incoming_by_source_type() {
        let mut g = Graph::new();
        g.add_node(GraphNode::input("i1", "seed")).unwrap();
        g.add_node(GraphNode::context("c1", "kb", SearchDepth::Balanced))
            .unwrap();
        g.add_node(GraphNode::generation("g1", "m", Provider::Local, "p"))
            .unwrap();
        g.add_edge(Edge::between("i1", "g1")).unwrap();
        g.add_edge(Edge::between("c1", "g1")).unwrap();

        let index = DegreeIndex::build(&g);
        let d = index.degrees(&"g1".into());
        assert_eq!(d.incoming_input, 1);
        assert_eq!(d.incoming_context, 1);
        assert_eq!(d.incoming_other, 0);
        assert_eq!(d.non_context_incoming(), 1);
        assert_eq!(index.degrees(&"i1".into()).outgoing, 1);
    }
}
