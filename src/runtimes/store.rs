//! Per-run execution state, mutated only by the stream reducer.
//!
//! [`ExecutionStateStore`] keys node lifecycle state, streaming buffers,
//! and final reports by node id, plus the whole-run fields. External
//! consumers get read-only projections; all mutators are crate-private so
//! the reducer stays the single writer.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;

use super::event::{NodeReport, RunOutcome};
use crate::types::NodeId;

/// Lifecycle state of one node within a run.
///
/// Transitions are monotonic: `Idle → Executing → (Completed | Failed)`,
/// with the direct `Idle → Completed/Failed` hop allowed for nodes whose
/// start event never arrived. A new run resets every node to `Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionPhase {
    #[default]
    Idle,
    Executing,
    Completed,
    Failed,
}

impl ExecutionPhase {
    /// `true` once the node reached `Completed` or `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionPhase::Completed | ExecutionPhase::Failed)
    }
}

/// Execution state of one node: phase, streamed text, final report.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NodeExecution {
    pub phase: ExecutionPhase,
    /// Append-only accumulation of streamed fragments. Superseded — but
    /// not cleared — once the final report arrives.
    pub buffer: String,
    /// Authoritative result, written when the node's terminal event
    /// arrives.
    pub result: Option<NodeReport>,
}

impl NodeExecution {
    /// The text a renderer should show right now: the authoritative
    /// report once present, otherwise whatever has streamed in.
    #[must_use]
    pub fn display_text(&self) -> &str {
        if let Some(report) = &self.result {
            if let Some(description) = &report.description {
                return description;
            }
            if let Some(error) = &report.error {
                return error;
            }
        }
        &self.buffer
    }
}

/// Execution state for a whole run, keyed by node id.
///
/// Constructed once per run and discarded at run end; there is no
/// process-wide instance. The reducer is the only writer.
#[derive(Clone, Debug, Default)]
pub struct ExecutionStateStore {
    nodes: FxHashMap<NodeId, NodeExecution>,
    start_order: Vec<NodeId>,
    is_running: bool,
    execution_id: Option<String>,
    outcome: Option<RunOutcome>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl ExecutionStateStore {
    /// An empty store with no tracked nodes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Mutators — crate-private; only the reducer calls these.
    // ------------------------------------------------------------------

    /// Begin a new run over the given node set.
    ///
    /// Every listed node is reset to `Idle` with an empty buffer and no
    /// result; the start order, run outcome, and execution id are
    /// cleared; `is_running` flips on.
    pub(crate) fn reset_for_run(&mut self, node_ids: impl IntoIterator<Item = NodeId>) {
        self.nodes = node_ids
            .into_iter()
            .map(|id| (id, NodeExecution::default()))
            .collect();
        self.start_order.clear();
        self.execution_id = None;
        self.outcome = None;
        self.is_running = true;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
    }

    pub(crate) fn set_execution_id(&mut self, id: Option<String>) {
        self.execution_id = id;
    }

    /// Mark a node executing. Returns `false` for unknown ids and for
    /// nodes already past `Idle` (late or duplicate starts).
    pub(crate) fn mark_started(&mut self, id: &NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        match node.phase {
            ExecutionPhase::Idle => {
                node.phase = ExecutionPhase::Executing;
                if !self.start_order.contains(id) {
                    self.start_order.push(id.clone());
                }
                true
            }
            ExecutionPhase::Executing => {
                // Duplicate start: keep the phase, but make sure the
                // ordering projection knows about the node.
                if !self.start_order.contains(id) {
                    self.start_order.push(id.clone());
                }
                false
            }
            _ => false,
        }
    }

    /// Append a streamed fragment. No-op unless the node is currently
    /// executing and the fragment is non-empty.
    pub(crate) fn append_fragment(&mut self, id: &NodeId, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self.nodes.get_mut(id) {
            Some(node) if node.phase == ExecutionPhase::Executing => {
                node.buffer.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Record a node's terminal report, forcing its phase to match the
    /// report's `success` flag. Returns `false` for unknown ids.
    pub(crate) fn record_node_report(&mut self, id: &NodeId, report: NodeReport) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.phase = if report.success {
            ExecutionPhase::Completed
        } else {
            ExecutionPhase::Failed
        };
        node.result = Some(report);
        true
    }

    /// Fold in the authoritative whole-run outcome.
    ///
    /// Every per-node entry overwrites that node's report and phase —
    /// the batch result wins over anything the per-event flow recorded.
    /// Entries for unknown node ids are skipped.
    pub(crate) fn finish_run(&mut self, outcome: RunOutcome) {
        for entry in &outcome.per_node_results {
            self.record_node_report(&entry.node_id, entry.report.clone());
        }
        self.outcome = Some(outcome);
        self.is_running = false;
        self.finished_at = Some(Utc::now());
    }

    /// End the run in failure without touching individual node phases.
    ///
    /// Nodes still `Executing` stay that way on purpose — the UI surfaces
    /// them as stuck rather than inventing terminal states for them.
    pub(crate) fn fail_run(&mut self, message: impl Into<String>) {
        self.outcome = Some(RunOutcome::failure(message));
        self.is_running = false;
        self.finished_at = Some(Utc::now());
    }

    // ------------------------------------------------------------------
    // Read-only projections.
    // ------------------------------------------------------------------

    /// Whether a run is currently active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// The backend's execution id for the active run, once known.
    #[must_use]
    pub fn execution_id(&self) -> Option<&str> {
        self.execution_id.as_deref()
    }

    /// The whole-run outcome, once a terminal event has arrived.
    #[must_use]
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// When the current run started, in client wall-clock time.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the current run ended, in client wall-clock time.
    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Execution state of one node.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeExecution> {
        self.nodes.get(id)
    }

    /// Number of tracked nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The ids in the order their start events arrived.
    #[must_use]
    pub fn start_order(&self) -> &[NodeId] {
        &self.start_order
    }

    /// All nodes, ordered for display: first the nodes that actually
    /// started, in start order; then every node that never reported a
    /// start, in id order. Stable and explainable even when start events
    /// were dropped or arrived out of order.
    #[must_use]
    pub fn ordered_nodes(&self) -> Vec<(&NodeId, &NodeExecution)> {
        let mut ordered: Vec<(&NodeId, &NodeExecution)> = Vec::with_capacity(self.nodes.len());
        for id in &self.start_order {
            if let Some((key, node)) = self.nodes.get_key_value(id) {
                ordered.push((key, node));
            }
        }
        let mut unstarted: Vec<(&NodeId, &NodeExecution)> = self
            .nodes
            .iter()
            .filter(|(id, _)| !self.start_order.contains(id))
            .collect();
        unstarted.sort_by(|a, b| a.0.cmp(b.0));
        ordered.extend(unstarted);
        ordered
    }
}
