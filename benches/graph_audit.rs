use criterion::{Criterion, black_box, criterion_group, criterion_main};

use loomflow::graphs::{Graph, GraphNode, validate_graph};
use loomflow::types::{Provider, SearchDepth};

/// A plausibly shaped authoring graph: `width` parallel
/// generation branches with contexts, merged by an ensemble, checked by a
/// validation step, ending in one output.
fn fan_graph(width: usize) -> Graph {
    let mut graph = Graph::new();
    graph.add_node(GraphNode::input("i0", "seed")).unwrap();
    graph.add_node(GraphNode::ensemble("merge", "m", Provider::OpenAi, "p")).unwrap();
    graph.add_node(GraphNode::validation("check", "m", Provider::OpenAi, "p")).unwrap();
    graph.add_node(GraphNode::output("out")).unwrap();

    for i in 0..width {
        let gen_id = format!("g{i}");
        let ctx_id = format!("c{i}");
        graph
            .add_node(GraphNode::generation(gen_id.clone(), "m", Provider::OpenAi, "p"))
            .unwrap();
        graph
            .add_node(GraphNode::context(ctx_id.clone(), "kb", SearchDepth::Balanced))
            .unwrap();
        graph.connect(&"i0".into(), &gen_id.as_str().into()).unwrap();
        graph
            .connect(&ctx_id.as_str().into(), &gen_id.as_str().into())
            .unwrap();
        graph
            .connect(&gen_id.as_str().into(), &"merge".into())
            .unwrap();
    }
    graph.connect(&"merge".into(), &"check".into()).unwrap();
    graph.connect(&"check".into(), &"out".into()).unwrap();
    graph
}

fn bench_validate_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_graph");
    for width in [4usize, 32, 256] {
        let graph = fan_graph(width);
        group.bench_function(format!("fan_{width}"), |b| {
            b.iter(|| validate_graph(black_box(&graph)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validate_graph);
criterion_main!(benches);
