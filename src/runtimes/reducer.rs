//! Folds protocol events into the execution state store.
//!
//! One reducer per run, one event at a time, strictly in delivery order.
//! The reducer never suspends and never touches I/O; the transport is the
//! only point of asynchrony. Because application is strictly sequential,
//! a later authoritative event (`run_complete`) can deterministically
//! overwrite earlier speculative state (`node_streaming`).

use tracing::{debug, warn};

use super::event::RunEvent;
use super::store::ExecutionStateStore;
use crate::types::NodeId;

/// Applies [`RunEvent`]s to an [`ExecutionStateStore`].
///
/// Holds the full node id set so a `run_start` can reset the store for
/// the whole graph. Stale or unknown-id events are dropped with a log
/// line; nothing here returns an error — all domain failures are state.
///
/// # Examples
///
/// ```rust
/// use loomflow::runtimes::{ExecutionStateStore, NodeReport, RunEvent, StreamReducer};
///
/// let mut store = ExecutionStateStore::new();
/// let mut reducer = StreamReducer::new(vec!["g1".into()]);
///
/// reducer.apply(&mut store, RunEvent::RunStart { execution_id: None });
/// reducer.apply(&mut store, RunEvent::node_start("g1"));
/// reducer.apply(&mut store, RunEvent::streaming("g1", "hel"));
/// reducer.apply(&mut store, RunEvent::streaming("g1", "lo"));
/// reducer.apply(&mut store, RunEvent::node_complete("g1", NodeReport::success("hello")));
///
/// assert_eq!(store.node(&"g1".into()).unwrap().buffer, "hello");
/// ```
#[derive(Clone, Debug)]
pub struct StreamReducer {
    node_ids: Vec<NodeId>,
}

impl StreamReducer {
    /// Create a reducer for a run over the given node set.
    #[must_use]
    pub fn new(node_ids: Vec<NodeId>) -> Self {
        Self { node_ids }
    }

    /// Fold one event into the store.
    pub fn apply(&mut self, store: &mut ExecutionStateStore, event: RunEvent) {
        match event {
            RunEvent::RunStart { execution_id } => {
                store.reset_for_run(self.node_ids.iter().cloned());
                if let Some(id) = &execution_id {
                    debug!(execution_id = %id, "run accepted by backend");
                }
                store.set_execution_id(execution_id);
            }
            RunEvent::NodeStart { node_id } => {
                if !store.mark_started(&node_id) {
                    debug!(node = %node_id, "ignoring stale or duplicate node_start");
                }
            }
            RunEvent::NodeStreaming { node_id, text } => {
                // Empty fragments are explicit no-ops; anything else only
                // lands while the node is executing.
                if !text.is_empty() && !store.append_fragment(&node_id, &text) {
                    debug!(node = %node_id, "dropping fragment for non-executing node");
                }
            }
            RunEvent::NodeComplete { node_id, report } => {
                if !store.record_node_report(&node_id, report) {
                    warn!(node = %node_id, "node_complete for unknown node id");
                }
            }
            RunEvent::RunComplete(outcome) => {
                for entry in &outcome.per_node_results {
                    if store.node(&entry.node_id).is_none() {
                        warn!(node = %entry.node_id, "run_complete entry for unknown node id");
                    }
                }
                store.finish_run(outcome);
            }
            RunEvent::RunError { message } => {
                warn!(error = %message, "run failed");
                store.fail_run(message);
            }
        }
    }
}
