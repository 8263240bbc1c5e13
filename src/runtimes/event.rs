//! Protocol events delivered by the execution backend.
//!
//! The backend streams newline-framed JSON records, each carrying a
//! `type` discriminator. [`RunEvent`] is the parsed form the reducer
//! consumes; older backend builds use a few alternate discriminators
//! (`execution_started`, `workflow_complete`, `error`) which are accepted
//! as aliases.

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Final result reported for one node.
///
/// Written once per node per run. When `success` is false, `error` holds
/// the backend's explanation; `description` is the authoritative output
/// text that supersedes any streamed fragments for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock execution time in seconds, as measured by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
}

impl NodeReport {
    /// A successful report carrying the final output text.
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            success: true,
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// A failed report carrying the backend's error text.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Attach the backend-measured execution time, in seconds.
    #[must_use]
    pub fn with_execution_time(mut self, seconds: f64) -> Self {
        self.execution_time = Some(seconds);
        self
    }
}

/// One entry of a run outcome's per-node result list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReportEntry {
    pub node_id: NodeId,
    #[serde(flatten)]
    pub report: NodeReport,
}

impl NodeReportEntry {
    pub fn new(node_id: impl Into<NodeId>, report: NodeReport) -> Self {
        Self {
            node_id: node_id.into(),
            report,
        }
    }
}

/// Authoritative result for a whole run.
///
/// Arrives exactly once, on the terminal `run_complete` event — or is
/// synthesized locally when the backend reports a whole-run failure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub success: bool,
    #[serde(default)]
    pub per_node_results: Vec<NodeReportEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_output: Option<String>,
    /// Whole-run wall-clock time in seconds.
    #[serde(default)]
    pub total_execution_time: f64,
    /// The order in which the backend executed nodes.
    #[serde(default)]
    pub execution_order: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    /// A locally synthesized whole-run failure (backend `run_error`,
    /// cancellation acknowledgement, transport teardown).
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

/// A single protocol event, in delivery order.
///
/// # Wire format
///
/// ```json
/// {"type": "node_streaming", "nodeId": "g1", "text": "partial out"}
/// ```
///
/// # Examples
///
/// ```rust
/// use loomflow::runtimes::RunEvent;
///
/// let event: RunEvent =
///     serde_json::from_str(r#"{"type":"node_start","nodeId":"g1"}"#).unwrap();
/// assert_eq!(event, RunEvent::node_start("g1"));
/// assert!(!event.is_terminal());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// The backend accepted the run and assigned an execution id.
    #[serde(alias = "execution_started", rename_all = "camelCase")]
    RunStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        execution_id: Option<String>,
    },

    /// A node began executing.
    #[serde(rename_all = "camelCase")]
    NodeStart { node_id: NodeId },

    /// A fragment of a node's streamed output.
    #[serde(rename_all = "camelCase")]
    NodeStreaming {
        node_id: NodeId,
        #[serde(default, alias = "chunk")]
        text: String,
    },

    /// A node finished, successfully or not.
    #[serde(rename_all = "camelCase")]
    NodeComplete {
        node_id: NodeId,
        #[serde(flatten)]
        report: NodeReport,
    },

    /// The whole run finished; carries the authoritative batch result.
    #[serde(alias = "workflow_complete")]
    RunComplete(RunOutcome),

    /// The whole run failed before completing.
    #[serde(alias = "error")]
    RunError { message: String },
}

impl RunEvent {
    /// A `run_start` event carrying the backend's execution id.
    pub fn run_start(execution_id: impl Into<String>) -> Self {
        RunEvent::RunStart {
            execution_id: Some(execution_id.into()),
        }
    }

    /// A `node_start` event.
    pub fn node_start(node_id: impl Into<NodeId>) -> Self {
        RunEvent::NodeStart {
            node_id: node_id.into(),
        }
    }

    /// A `node_streaming` event carrying one output fragment.
    pub fn streaming(node_id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        RunEvent::NodeStreaming {
            node_id: node_id.into(),
            text: text.into(),
        }
    }

    /// A `node_complete` event wrapping the node's final report.
    pub fn node_complete(node_id: impl Into<NodeId>, report: NodeReport) -> Self {
        RunEvent::NodeComplete {
            node_id: node_id.into(),
            report,
        }
    }

    /// A `run_error` event.
    pub fn run_error(message: impl Into<String>) -> Self {
        RunEvent::RunError {
            message: message.into(),
        }
    }

    /// The node this event concerns, when it is node-scoped.
    #[must_use]
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            RunEvent::NodeStart { node_id }
            | RunEvent::NodeStreaming { node_id, .. }
            | RunEvent::NodeComplete { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    /// `true` for events after which no further events are expected for
    /// the run as a whole.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::RunComplete(_) | RunEvent::RunError { .. })
    }
}
