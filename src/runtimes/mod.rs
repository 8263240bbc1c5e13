//! Streaming execution runtime: events, state, reduction, transport.
//!
//! Everything that happens after [`validate_graph`](crate::graphs::validate_graph)
//! clears a snapshot lives here. The pipeline is strictly sequential:
//!
//! ```text
//! backend bytes ─► FrameDecoder ─► RunEventStream ─► StreamReducer ─► ExecutionStateStore
//! ```
//!
//! The transport is the only suspension point; the reducer applies one
//! event at a time with no concurrent mutation, which is what lets the
//! authoritative `run_complete` batch result overwrite earlier
//! speculative streaming state deterministically.
//!
//! # Example
//!
//! ```rust
//! use loomflow::runtimes::{ExecutionStateStore, NodeReport, RunEvent, StreamReducer};
//!
//! let mut store = ExecutionStateStore::new();
//! let mut reducer = StreamReducer::new(vec!["g1".into(), "o1".into()]);
//!
//! reducer.apply(&mut store, RunEvent::run_start("exec-7"));
//! reducer.apply(&mut store, RunEvent::node_start("g1"));
//! reducer.apply(&mut store, RunEvent::streaming("g1", "partial"));
//! reducer.apply(&mut store, RunEvent::node_complete("g1", NodeReport::success("full")));
//!
//! assert_eq!(store.node(&"g1".into()).unwrap().display_text(), "full");
//! ```

mod config;
mod event;
mod http;
mod reducer;
mod session;
mod store;
mod transport;

pub use config::RuntimeConfig;
pub use event::{NodeReport, NodeReportEntry, RunEvent, RunOutcome};
pub use http::HttpTransport;
pub use reducer::StreamReducer;
pub use session::{RunSession, SessionError};
pub use store::{ExecutionPhase, ExecutionStateStore, NodeExecution};
pub use transport::{FrameDecoder, RunEventStream, RunRequest, Transport, TransportError};
