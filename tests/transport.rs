#[macro_use]
extern crate proptest;

use proptest::prelude::prop;

use loomflow::graphs::{Graph, GraphNode};
use loomflow::runtimes::{
    ExecutionPhase, ExecutionStateStore, FrameDecoder, HttpTransport, RunEvent, RunRequest,
    RuntimeConfig, StreamReducer, Transport, TransportError,
};
use loomflow::types::Provider;

fn transcript() -> Vec<u8> {
    [
        r#"{"type":"run_start","executionId":"exec-9"}"#,
        r#"{"type":"node_start","nodeId":"g1"}"#,
        r#"{"type":"node_streaming","nodeId":"g1","text":"hel"}"#,
        r#"{"type":"node_streaming","nodeId":"g1","text":"lo"}"#,
        r#"{"type":"node_complete","nodeId":"g1","success":true,"description":"hello"}"#,
        r#"{"type":"run_complete","success":true,"perNodeResults":[{"nodeId":"g1","success":true,"description":"hello"}],"finalOutput":"hello","totalExecutionTime":0.8,"executionOrder":["g1"]}"#,
    ]
    .join("\n")
    .into_bytes()
}

fn decode_all(chunks: impl IntoIterator<Item = Vec<u8>>) -> Vec<RunEvent> {
    let mut decoder = FrameDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.feed(&chunk));
    }
    events.extend(decoder.finish());
    events
}

#[test]
fn whole_transcript_in_one_chunk() {
    let events = decode_all([transcript()]);
    assert_eq!(events.len(), 6);
    assert!(events[5].is_terminal());
}

#[test]
fn byte_at_a_time_delivery_yields_the_same_events() {
    let whole = decode_all([transcript()]);
    let trickled = decode_all(transcript().into_iter().map(|b| vec![b]));
    assert_eq!(whole, trickled);
}

proptest! {
    /// Chunk boundaries never duplicate or drop records: any partition of
    /// the byte stream decodes to the same event sequence.
    #[test]
    fn prop_decoding_is_invariant_under_chunking(
        cuts in prop::collection::vec(0usize..400, 0..12),
    ) {
        let bytes = transcript();
        let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c % bytes.len()).collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut chunks = Vec::new();
        let mut last = 0;
        for cut in cuts {
            chunks.push(bytes[last..cut].to_vec());
            last = cut;
        }
        chunks.push(bytes[last..].to_vec());

        prop_assert_eq!(decode_all(chunks), decode_all([bytes]));
    }
}

#[test]
fn pipeline_reconciles_through_decoder_and_reducer() {
    // Interleave a malformed record and a late duplicate; the pipeline
    // must shrug both off and land on the batch result.
    let body = [
        r#"{"type":"run_start","executionId":"exec-2"}"#,
        r#"{"type":"node_start","nodeId":"g1"}"#,
        r#"{{{ not a record"#,
        r#"{"type":"node_streaming","nodeId":"g1","text":"draft"}"#,
        r#"{"type":"node_complete","nodeId":"g1","success":true,"description":"draft"}"#,
        r#"{"type":"node_streaming","nodeId":"g1","text":"straggler"}"#,
        r#"{"type":"run_complete","success":false,"perNodeResults":[{"nodeId":"g1","success":false,"error":"quality gate"}],"totalExecutionTime":1.1,"executionOrder":["g1"]}"#,
    ]
    .join("\n")
    .into_bytes();

    let mut store = ExecutionStateStore::new();
    let mut reducer = StreamReducer::new(vec!["g1".into()]);
    for event in decode_all([body]) {
        reducer.apply(&mut store, event);
    }

    let g1 = store.node(&"g1".into()).unwrap();
    assert_eq!(g1.phase, ExecutionPhase::Failed);
    assert_eq!(g1.buffer, "draft");
    assert_eq!(g1.result.as_ref().unwrap().error.as_deref(), Some("quality gate"));
    assert!(!store.is_running());
}

#[tokio::test]
async fn chunked_async_delivery_decodes_incrementally() {
    use futures_util::StreamExt;

    let bytes = transcript();
    let chunks: Vec<Vec<u8>> = bytes.chunks(7).map(<[u8]>::to_vec).collect();
    let stream = async_stream::stream! {
        for chunk in chunks {
            yield chunk;
        }
    };
    futures_util::pin_mut!(stream);

    let mut decoder = FrameDecoder::new();
    let mut events = Vec::new();
    while let Some(chunk) = stream.next().await {
        events.extend(decoder.feed(&chunk));
    }
    events.extend(decoder.finish());

    assert_eq!(events, decode_all([transcript()]));
}

fn run_request() -> RunRequest {
    let mut graph = Graph::new();
    graph.add_node(GraphNode::input("i1", "q")).unwrap();
    graph
        .add_node(GraphNode::generation("g1", "m", Provider::Local, "p"))
        .unwrap();
    graph.add_node(GraphNode::output("o1")).unwrap();
    graph.connect(&"i1".into(), &"g1".into()).unwrap();
    graph.connect(&"g1".into(), &"o1".into()).unwrap();
    RunRequest::from_graph(&graph)
}

#[tokio::test(flavor = "multi_thread")]
async fn http_transport_streams_decoded_events() {
    let server = httpmock::MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::POST).path("/api/runs");
            then.status(200)
                .body(String::from_utf8(transcript()).unwrap());
        })
        .await;

    let transport = HttpTransport::new(RuntimeConfig::new(server.base_url())).unwrap();
    let events = transport.start(run_request()).await.unwrap();

    let mut collected = Vec::new();
    while let Some(event) = events.next().await {
        collected.push(event);
    }
    mock.assert_async().await;
    assert_eq!(collected.len(), 6);
    assert_eq!(collected[0], RunEvent::run_start("exec-9"));
    assert!(collected[5].is_terminal());
}

#[tokio::test(flavor = "multi_thread")]
async fn http_transport_surfaces_backend_rejection() {
    let server = httpmock::MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::POST).path("/api/runs");
            then.status(503);
        })
        .await;

    let transport = HttpTransport::new(RuntimeConfig::new(server.base_url())).unwrap();
    let err = transport.start(run_request()).await.unwrap_err();
    assert!(matches!(err, TransportError::Rejected { status: 503 }));
}

#[tokio::test(flavor = "multi_thread")]
async fn http_transport_posts_cancellation() {
    let server = httpmock::MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/api/runs/exec-9/stop");
            then.status(200);
        })
        .await;

    let transport = HttpTransport::new(RuntimeConfig::new(server.base_url())).unwrap();
    transport.cancel("exec-9").await.unwrap();
    mock.assert_async().await;
}
