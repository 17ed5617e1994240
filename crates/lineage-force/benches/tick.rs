use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use lineage_force::{Category, Edge, Graph, Node, RelationKind, Simulation, SimulationConfig};
use std::hint::black_box;
use std::time::Duration;

/// Layered lineage graph: `width` tables per layer, each feeding two nodes of the next layer.
fn layered(layers: usize, width: usize) -> Graph {
    let id = |l: usize, i: usize| format!("L{l}N{i}");
    let mut nodes = Vec::with_capacity(layers * width);
    let mut edges = Vec::new();
    for l in 0..layers {
        let category = match l % 3 {
            0 => Category::Table,
            1 => Category::Pipeline,
            _ => Category::System,
        };
        for i in 0..width {
            nodes.push(Node::new(id(l, i), id(l, i), category));
            if l + 1 < layers {
                edges.push(Edge::new(id(l, i), id(l + 1, i), RelationKind::FlowsTo));
                edges.push(Edge::new(
                    id(l, i),
                    id(l + 1, (i + 1) % width),
                    RelationKind::ProcessedBy,
                ));
            }
        }
    }
    Graph::new(nodes, edges)
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.measurement_time(Duration::from_secs(5));
    for (layers, width) in [(5, 10), (10, 50), (20, 100)] {
        let graph = layered(layers, width);
        group.bench_with_input(
            BenchmarkId::from_parameter(layers * width),
            &graph,
            |b, graph| {
                b.iter_batched(
                    || {
                        let mut sim = Simulation::new(graph, SimulationConfig::default()).unwrap();
                        sim.start();
                        sim
                    },
                    |mut sim| {
                        for _ in 0..10 {
                            sim.tick();
                        }
                        black_box(sim.alpha())
                    },
                    BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let graph = layered(10, 20);
    c.bench_function("layout_200_nodes", |b| {
        b.iter(|| black_box(lineage_force::layout(&graph, SimulationConfig::default()).unwrap()))
    });
}

criterion_group!(benches, bench_tick, bench_layout);
criterion_main!(benches);
