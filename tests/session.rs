use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use loomflow::graphs::{Graph, GraphNode};
use loomflow::runtimes::{
    ExecutionPhase, NodeReport, NodeReportEntry, RunEvent, RunEventStream, RunOutcome, RunRequest,
    RunSession, SessionError, Transport, TransportError,
};
use loomflow::types::Provider;

/// Transport that replays a scripted event list and records cancellations.
struct ScriptedTransport {
    script: Mutex<Vec<RunEvent>>,
    /// Senders kept open so a test can decide when the stream ends.
    hold_open: Mutex<Vec<flume::Sender<RunEvent>>>,
    keep_stream_open: bool,
    cancels: AtomicUsize,
}

impl ScriptedTransport {
    fn replaying(script: Vec<RunEvent>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            hold_open: Mutex::new(Vec::new()),
            keep_stream_open: false,
            cancels: AtomicUsize::new(0),
        })
    }

    fn hanging(script: Vec<RunEvent>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            hold_open: Mutex::new(Vec::new()),
            keep_stream_open: true,
            cancels: AtomicUsize::new(0),
        })
    }

    fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    fn release_streams(&self) {
        self.hold_open.lock().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn start(&self, _request: RunRequest) -> Result<RunEventStream, TransportError> {
        let (tx, stream) = RunEventStream::channel();
        for event in self.script.lock().drain(..) {
            let _ = tx.send(event);
        }
        if self.keep_stream_open {
            self.hold_open.lock().push(tx);
        }
        Ok(stream)
    }

    async fn cancel(&self, _execution_id: &str) -> Result<(), TransportError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn valid_graph() -> Graph {
    let mut graph = Graph::new();
    graph.add_node(GraphNode::input("i1", "q")).unwrap();
    graph
        .add_node(GraphNode::generation("g1", "m", Provider::Anthropic, "p"))
        .unwrap();
    graph.add_node(GraphNode::output("o1")).unwrap();
    graph.connect(&"i1".into(), &"g1".into()).unwrap();
    graph.connect(&"g1".into(), &"o1".into()).unwrap();
    graph
}

fn happy_script() -> Vec<RunEvent> {
    vec![
        RunEvent::run_start("exec-1"),
        RunEvent::node_start("g1"),
        RunEvent::streaming("g1", "answer"),
        RunEvent::node_complete("g1", NodeReport::success("answer")),
        RunEvent::RunComplete(RunOutcome {
            success: true,
            per_node_results: vec![
                NodeReportEntry::new("g1", NodeReport::success("answer")),
                NodeReportEntry::new("o1", NodeReport::success("answer")),
            ],
            final_output: Some("answer".into()),
            total_execution_time: 0.4,
            execution_order: vec!["g1".into(), "o1".into()],
            ..Default::default()
        }),
    ]
}

#[tokio::test]
async fn run_drives_the_stream_to_its_outcome() {
    let session = RunSession::new(ScriptedTransport::replaying(happy_script()));
    let outcome = session.run(&valid_graph()).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.final_output.as_deref(), Some("answer"));
    assert!(!session.is_running());

    let snapshot = session.snapshot();
    assert_eq!(
        snapshot.node(&"g1".into()).unwrap().phase,
        ExecutionPhase::Completed
    );
    assert_eq!(snapshot.execution_id(), Some("exec-1"));
}

#[tokio::test]
async fn invalid_graph_never_reaches_the_transport() {
    let transport = ScriptedTransport::replaying(happy_script());
    let session = RunSession::new(transport.clone());

    let mut incomplete = Graph::new();
    incomplete.add_node(GraphNode::input("i1", "q")).unwrap();

    let err = session.run(&incomplete).await.unwrap_err();
    let SessionError::InvalidGraph { issues } = err else {
        panic!("expected InvalidGraph, got {err}");
    };
    assert!(!issues.is_empty());
    // The script was never consumed.
    assert_eq!(transport.script.lock().len(), happy_script().len());
}

#[tokio::test]
async fn second_run_is_rejected_while_the_first_is_active() {
    let transport = ScriptedTransport::hanging(vec![RunEvent::run_start("exec-1")]);
    let session = Arc::new(RunSession::new(transport.clone()));
    let graph = valid_graph();

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        let graph = graph.clone();
        async move { session.run(&graph).await }
    });

    // Wait until the first run has claimed the session.
    while !session.is_running() {
        tokio::task::yield_now().await;
    }

    let err = session.run(&graph).await.unwrap_err();
    assert!(matches!(err, SessionError::AlreadyRunning));

    transport.release_streams();
    let outcome = first.await.unwrap().unwrap();
    // The stream closed without a terminal event; the run folds to failure.
    assert!(!outcome.success);
}

#[tokio::test]
async fn stop_signals_the_backend_and_ends_the_run() {
    let transport = ScriptedTransport::hanging(vec![RunEvent::run_start("exec-1")]);
    let session = Arc::new(RunSession::new(transport.clone()));

    let running = tokio::spawn({
        let session = Arc::clone(&session);
        let graph = valid_graph();
        async move { session.run(&graph).await }
    });

    while session.snapshot().execution_id().is_none() {
        tokio::task::yield_now().await;
    }

    session.stop().await.unwrap();
    assert_eq!(transport.cancel_count(), 1);

    transport.release_streams();
    let outcome = running.await.unwrap().unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("execution cancelled by user"));
    assert!(!session.is_running());
}

#[tokio::test]
async fn stop_without_a_run_is_an_error() {
    let session = RunSession::new(ScriptedTransport::replaying(Vec::new()));
    let err = session.stop().await.unwrap_err();
    assert!(matches!(err, SessionError::NotRunning));
}

#[tokio::test]
async fn stop_before_the_backend_assigns_an_id_is_an_error() {
    // run_start never arrives, so no execution id is ever known.
    let transport = ScriptedTransport::hanging(Vec::new());
    let session = Arc::new(RunSession::new(transport.clone()));

    let running = tokio::spawn({
        let session = Arc::clone(&session);
        let graph = valid_graph();
        async move { session.run(&graph).await }
    });

    while !session.is_running() {
        tokio::task::yield_now().await;
    }

    let err = session.stop().await.unwrap_err();
    assert!(matches!(err, SessionError::NoExecutionId));
    assert_eq!(transport.cancel_count(), 0);

    transport.release_streams();
    let _ = running.await.unwrap();
}

#[tokio::test]
async fn listener_receives_every_applied_event() {
    let (tx, rx) = flume::unbounded();
    let session =
        RunSession::new(ScriptedTransport::replaying(happy_script())).with_listener(tx);
    session.run(&valid_graph()).await.unwrap();

    let forwarded: Vec<RunEvent> = rx.drain().collect();
    assert_eq!(forwarded, happy_script());
}
