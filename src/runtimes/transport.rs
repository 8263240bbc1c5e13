//! Transport boundary: how protocol events reach the reducer.
//!
//! The backend streams newline-framed, optionally `data:`-prefixed JSON
//! records over a chunked byte stream. [`FrameDecoder`] buffers partial
//! reads across chunk boundaries so a record split across two reads is
//! parsed exactly once; malformed records are logged and skipped, never
//! fatal. [`Transport`] abstracts the wire so tests can drive the
//! reducer from synthetic streams, and [`RunEventStream`] is the channel
//! the decoded events arrive on.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use super::event::RunEvent;
use crate::graphs::{Edge, Graph, GraphNode};

/// Transport-level failures.
///
/// These cover reaching the backend at all; anything that happens after
/// the stream opens is expressed as protocol events, not errors.
#[derive(Debug, Error, Diagnostic)]
pub enum TransportError {
    #[error("failed to reach the execution backend: {message}")]
    #[diagnostic(code(loomflow::transport::connect))]
    Connect { message: String },

    #[error("backend refused the run request with status {status}")]
    #[diagnostic(code(loomflow::transport::rejected))]
    Rejected { status: u16 },

    #[error("cancellation request failed: {message}")]
    #[diagnostic(code(loomflow::transport::cancel))]
    Cancel { message: String },
}

/// The serialized graph snapshot handed to the backend when a run starts.
///
/// Nodes carry their type-specific configuration as plain data; the
/// backend derives execution order itself.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Client-generated id correlating this request with its event stream.
    pub run_id: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
}

impl RunRequest {
    /// Snapshot a graph into a run request with a fresh run id.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().cloned().collect(),
        }
    }
}

/// Incremental decoder for newline-framed protocol records.
///
/// Feed raw chunks as they arrive; complete records come back as parsed
/// events. Bytes after the last newline stay buffered until the next
/// chunk (or [`finish`](Self::finish)) completes them — so a record
/// split across two reads is parsed once, and never dropped.
///
/// # Examples
///
/// ```rust
/// use loomflow::runtimes::{FrameDecoder, RunEvent};
///
/// let mut decoder = FrameDecoder::new();
/// assert!(decoder.feed(b"{\"type\":\"node_start\",\"no").is_empty());
/// let events = decoder.feed(b"deId\":\"g1\"}\n");
/// assert_eq!(events, vec![RunEvent::node_start("g1")]);
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes; returns every record completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RunEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = Self::parse_record(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing record the stream ended without terminating.
    pub fn finish(&mut self) -> Option<RunEvent> {
        let line = std::mem::take(&mut self.buffer);
        Self::parse_record(&line)
    }

    /// Bytes currently buffered awaiting a newline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn parse_record(line: &[u8]) -> Option<RunEvent> {
        let text = match std::str::from_utf8(line) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "skipping non-utf8 protocol record");
                return None;
            }
        };
        let text = text.trim_end_matches('\r');
        // SSE-style producers prefix records with "data:"; accept both.
        let payload = text
            .strip_prefix("data:")
            .map(str::trim_start)
            .unwrap_or(text)
            .trim();
        if payload.is_empty() {
            return None;
        }
        match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(error = %err, record = %payload, "skipping malformed protocol record");
                None
            }
        }
    }
}

/// Receiving end of a decoded event stream.
///
/// A thin wrapper over a `flume` channel; the producing side lives inside
/// the transport implementation.
#[derive(Debug)]
pub struct RunEventStream {
    receiver: flume::Receiver<RunEvent>,
}

impl RunEventStream {
    /// Create a connected sender/stream pair.
    #[must_use]
    pub fn channel() -> (flume::Sender<RunEvent>, Self) {
        let (tx, rx) = flume::unbounded();
        (tx, Self { receiver: rx })
    }

    /// Await the next event; `None` once the producer hangs up.
    pub async fn next(&self) -> Option<RunEvent> {
        self.receiver.recv_async().await.ok()
    }

    /// Adapt into a [`futures_util::Stream`] for combinator-style use.
    #[must_use]
    pub fn into_stream(self) -> impl futures_util::Stream<Item = RunEvent> {
        self.receiver.into_stream()
    }
}

/// The backend wire, as the session sees it.
///
/// `start` submits a run request and yields the decoded event stream;
/// `cancel` signals best-effort cancellation for a previously started
/// execution. Implementations own all buffering and framing — the
/// reducer side only ever sees whole events.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit a run and open its event stream.
    async fn start(&self, request: RunRequest) -> Result<RunEventStream, TransportError>;

    /// Ask the backend to stop the given execution.
    ///
    /// Cooperative: acknowledgement means the backend heard the request,
    /// not that every node already stopped.
    async fn cancel(&self, execution_id: &str) -> Result<(), TransportError>;
}
