//! Node records and their type-specific configuration payloads.
//!
//! A [`GraphNode`] pairs an opaque id with a [`NodeConfig`] — a tagged
//! variant keyed by node type, so each arm carries only the fields that
//! type actually uses — plus a layout [`Position`] that the engine carries
//! opaquely for external rendering.

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, NodeType, Provider, SearchDepth};

/// Canvas coordinates of a node.
///
/// Opaque to the engine; carried only so external rendering layers can
/// round-trip layout through graph snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Model settings shared by the generation-class node types
/// (`Generation`, `Ensemble`, `Validation`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    /// Model identifier as the backend understands it, e.g. `"gpt-4o"`.
    pub model: String,
    /// Which provider hosts the model.
    pub provider: Provider,
    /// Prompt template applied to the node's upstream inputs.
    pub prompt: String,
}

impl ModelSpec {
    pub fn new(
        model: impl Into<String>,
        provider: Provider,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            provider,
            prompt: prompt.into(),
        }
    }
}

/// Type-specific configuration of a node.
///
/// Discriminated by `nodeType` on the wire, so a deserialized node can
/// never carry fields belonging to another type.
///
/// # Examples
///
/// ```rust
/// use loomflow::graphs::{ModelSpec, NodeConfig};
/// use loomflow::types::{NodeType, Provider};
///
/// let config = NodeConfig::Generation(ModelSpec::new(
///     "gpt-4o",
///     Provider::OpenAi,
///     "Summarize: {input}",
/// ));
/// assert_eq!(config.node_type(), NodeType::Generation);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum NodeConfig {
    /// Free text supplied by the user.
    Input { text: String },
    /// Single-model generation step.
    Generation(ModelSpec),
    /// Merge step over several upstream branches.
    Ensemble(ModelSpec),
    /// Check-and-refine step over one upstream branch.
    Validation(ModelSpec),
    /// Knowledge-base retrieval injection.
    #[serde(rename_all = "camelCase")]
    Context {
        /// Reference to the knowledge base to search, as the backend
        /// names it.
        knowledge_base: String,
        search_depth: SearchDepth,
    },
    /// Terminal sink; `text` holds the rendered final output, if any.
    Output { text: String },
}

impl NodeConfig {
    /// The node type this configuration belongs to.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeConfig::Input { .. } => NodeType::Input,
            NodeConfig::Generation(_) => NodeType::Generation,
            NodeConfig::Ensemble(_) => NodeType::Ensemble,
            NodeConfig::Validation(_) => NodeType::Validation,
            NodeConfig::Context { .. } => NodeType::Context,
            NodeConfig::Output { .. } => NodeType::Output,
        }
    }

    /// The model settings, for the generation-class types.
    #[must_use]
    pub fn model_spec(&self) -> Option<&ModelSpec> {
        match self {
            NodeConfig::Generation(spec)
            | NodeConfig::Ensemble(spec)
            | NodeConfig::Validation(spec) => Some(spec),
            _ => None,
        }
    }
}

/// A node in the authoring graph.
///
/// Use the convenience constructors rather than building the struct by
/// hand; they keep id, configuration, and type consistent by construction.
///
/// # Examples
///
/// ```rust
/// use loomflow::graphs::GraphNode;
/// use loomflow::types::{NodeType, Provider};
///
/// let input = GraphNode::input("i1", "What is Rust?");
/// let r#gen = GraphNode::generation("g1", "claude-sonnet-4-5", Provider::Anthropic, "{input}");
///
/// assert_eq!(input.node_type(), NodeType::Input);
/// assert_eq!(r#gen.node_type(), NodeType::Generation);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub config: NodeConfig,
    #[serde(default)]
    pub position: Position,
}

impl GraphNode {
    /// Create a node from an explicit configuration.
    pub fn new(id: impl Into<NodeId>, config: NodeConfig) -> Self {
        Self {
            id: id.into(),
            config,
            position: Position::default(),
        }
    }

    /// Create an `Input` node holding the given text.
    pub fn input(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self::new(id, NodeConfig::Input { text: text.into() })
    }

    /// Create a `Generation` node.
    pub fn generation(
        id: impl Into<NodeId>,
        model: impl Into<String>,
        provider: Provider,
        prompt: impl Into<String>,
    ) -> Self {
        Self::new(id, NodeConfig::Generation(ModelSpec::new(model, provider, prompt)))
    }

    /// Create an `Ensemble` node.
    pub fn ensemble(
        id: impl Into<NodeId>,
        model: impl Into<String>,
        provider: Provider,
        prompt: impl Into<String>,
    ) -> Self {
        Self::new(id, NodeConfig::Ensemble(ModelSpec::new(model, provider, prompt)))
    }

    /// Create a `Validation` node.
    pub fn validation(
        id: impl Into<NodeId>,
        model: impl Into<String>,
        provider: Provider,
        prompt: impl Into<String>,
    ) -> Self {
        Self::new(id, NodeConfig::Validation(ModelSpec::new(model, provider, prompt)))
    }

    /// Create a `Context` node pointing at a knowledge base.
    pub fn context(
        id: impl Into<NodeId>,
        knowledge_base: impl Into<String>,
        search_depth: SearchDepth,
    ) -> Self {
        Self::new(
            id,
            NodeConfig::Context {
                knowledge_base: knowledge_base.into(),
                search_depth,
            },
        )
    }

    /// Create an `Output` node.
    pub fn output(id: impl Into<NodeId>) -> Self {
        Self::new(id, NodeConfig::Output { text: String::new() })
    }

    /// Set the layout position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// The node's type, derived from its configuration.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.config.node_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_with_node_type_tag() {
        let node = GraphNode::context("c1", "docs", SearchDepth::Thorough).at(10.0, 20.0);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["nodeType"], "context");
        assert_eq!(json["knowledgeBase"], "docs");
        assert_eq!(json["searchDepth"], "thorough");

        let back: GraphNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn generation_config_rejects_foreign_fields_shape() {
        // A context payload tagged as generation must not deserialize.
        let raw = serde_json::json!({
            "id": "g1",
            "nodeType": "generation",
            "knowledgeBase": "docs"
        });
        assert!(serde_json::from_value::<GraphNode>(raw).is_err());
    }
}
