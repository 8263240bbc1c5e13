//! One end-to-end run over a validated graph.
//!
//! [`RunSession`] owns the shared [`ExecutionStateStore`] handle and a
//! [`Transport`], and drives the single-consumer event loop: receive one
//! event, fold it into the store, repeat until a terminal event. Only one
//! run may be active per session; a second `run` while one is in flight
//! is rejected as data. Cancellation is cooperative — [`stop`] signals
//! the backend and folds a run-error-class terminal event, leaving any
//! still-executing nodes visibly stuck for the UI to surface.

use std::sync::Arc;

use miette::Diagnostic;
use parking_lot::RwLock;
use thiserror::Error;

use super::config::RuntimeConfig;
use super::event::{RunEvent, RunOutcome};
use super::http::HttpTransport;
use super::reducer::StreamReducer;
use super::store::ExecutionStateStore;
use super::transport::{RunRequest, Transport, TransportError};
use crate::graphs::{Graph, validate_graph};
use crate::types::NodeId;

/// Message folded into the store when the user cancels a run.
const CANCELLED_MESSAGE: &str = "execution cancelled by user";

/// Failures starting, driving, or stopping a run.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("a run is already in progress")]
    #[diagnostic(code(loomflow::session::already_running))]
    AlreadyRunning,

    #[error("no run is in progress")]
    #[diagnostic(code(loomflow::session::not_running))]
    NotRunning,

    #[error("graph failed validation: {}", .issues.join("; "))]
    #[diagnostic(
        code(loomflow::session::invalid_graph),
        help("Fix the listed graph issues before starting a run.")
    )]
    InvalidGraph { issues: Vec<String> },

    #[error("the backend has not assigned an execution id yet")]
    #[diagnostic(code(loomflow::session::no_execution_id))]
    NoExecutionId,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),
}

/// Drives runs against a backend and owns their execution state.
///
/// # Examples
///
/// ```rust,no_run
/// use loomflow::graphs::{Graph, GraphNode};
/// use loomflow::runtimes::{RunSession, RuntimeConfig};
/// use loomflow::types::Provider;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut graph = Graph::new();
/// graph.add_node(GraphNode::input("i1", "hello"))?;
/// graph.add_node(GraphNode::generation("g1", "gpt-4o", Provider::OpenAi, "{input}"))?;
/// graph.add_node(GraphNode::output("o1"))?;
/// graph.connect(&"i1".into(), &"g1".into())?;
/// graph.connect(&"g1".into(), &"o1".into())?;
///
/// let session = RunSession::over_http(RuntimeConfig::default())?;
/// let outcome = session.run(&graph).await?;
/// println!("run finished: success={}", outcome.success);
/// # Ok(())
/// # }
/// ```
pub struct RunSession {
    transport: Arc<dyn Transport>,
    store: Arc<RwLock<ExecutionStateStore>>,
    listener: Option<flume::Sender<RunEvent>>,
}

impl RunSession {
    /// Create a session over an arbitrary transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            store: Arc::new(RwLock::new(ExecutionStateStore::new())),
            listener: None,
        }
    }

    /// Create a session over the HTTP transport.
    pub fn over_http(config: RuntimeConfig) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Forward every applied event to the given channel, for external
    /// observers that want pushes instead of polling snapshots.
    #[must_use]
    pub fn with_listener(mut self, listener: flume::Sender<RunEvent>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// The shared store handle, for readers that track state live.
    #[must_use]
    pub fn store(&self) -> Arc<RwLock<ExecutionStateStore>> {
        Arc::clone(&self.store)
    }

    /// A point-in-time copy of the execution state.
    #[must_use]
    pub fn snapshot(&self) -> ExecutionStateStore {
        self.store.read().clone()
    }

    /// Whether a run is currently active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.store.read().is_running()
    }

    /// Execute the graph and drive its event stream to completion.
    ///
    /// Validates the snapshot first, claims the session (rejecting a
    /// concurrent second run), then folds events one at a time until a
    /// terminal event arrives or the stream closes. A stream that closes
    /// without a terminal event is folded as a whole-run failure so the
    /// store never ends a run in limbo.
    pub async fn run(&self, graph: &Graph) -> Result<RunOutcome, SessionError> {
        let audit = validate_graph(graph);
        if !audit.is_valid() {
            return Err(SessionError::InvalidGraph {
                issues: audit.messages(),
            });
        }

        let node_ids: Vec<NodeId> = graph.node_ids().cloned().collect();
        {
            let mut store = self.store.write();
            if store.is_running() {
                return Err(SessionError::AlreadyRunning);
            }
            // Claim the session before the first await so a second run
            // cannot slip in while the request is in flight.
            store.reset_for_run(node_ids.iter().cloned());
        }

        let request = RunRequest::from_graph(graph);
        let events = match self.transport.start(request).await {
            Ok(events) => events,
            Err(err) => {
                self.store.write().fail_run(err.to_string());
                return Err(err.into());
            }
        };

        let mut reducer = StreamReducer::new(node_ids);
        while let Some(event) = events.next().await {
            if let Some(listener) = &self.listener {
                let _ = listener.send(event.clone());
            }
            let mut store = self.store.write();
            reducer.apply(&mut store, event);
            if !store.is_running() {
                break;
            }
        }

        let mut store = self.store.write();
        if store.is_running() {
            store.fail_run("event stream ended before a terminal event");
        }
        Ok(store
            .outcome()
            .cloned()
            .unwrap_or_else(|| RunOutcome::failure("run produced no outcome")))
    }

    /// Cooperatively cancel the active run.
    ///
    /// Signals the backend's stop endpoint with the execution id captured
    /// from `run_start`; on acknowledgement the run is folded to a
    /// terminal failure. Nodes left `Executing` are not retried or
    /// auto-failed here — the backend remains responsible for any
    /// per-node terminal events it still emits.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let execution_id = {
            let store = self.store.read();
            if !store.is_running() {
                return Err(SessionError::NotRunning);
            }
            store.execution_id().map(str::to_owned)
        };
        let execution_id = execution_id.ok_or(SessionError::NoExecutionId)?;

        self.transport.cancel(&execution_id).await?;
        self.store.write().fail_run(CANCELLED_MESSAGE);
        Ok(())
    }
}
