//! Benchmarks for state-space search and layout.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use puzzlespace::board::EightPuzzle;
use puzzlespace::force::ForceDirectedLayout;
use puzzlespace::layout::{Execution, LayoutConfig, LayoutStrategy, Repulsion};
use puzzlespace::search::{
    BreadthFirstSearch, CompleteSpaceExplorer, SearchAlgorithm, DEFAULT_VISUALIZATION_DEPTH,
};
use puzzlespace::spatial::OctreeBackend;

fn demo_goal() -> EightPuzzle {
    "5 4 3 / 1 0 7 / 2 8 6".parse().expect("valid board")
}

/// Benchmark breadth-first search to the demo goal.
fn bench_bfs(c: &mut Criterion) {
    let initial = EightPuzzle::solved();
    let goal = demo_goal();
    c.bench_function("bfs_demo_goal", |b| {
        b.iter(|| BreadthFirstSearch::new().search(black_box(&initial), &goal))
    });
}

/// Benchmark exhausting the whole 3x3 component.
fn bench_complete_exploration(c: &mut Criterion) {
    let initial = EightPuzzle::solved();
    let goal = demo_goal();
    let mut group = c.benchmark_group("explorer");
    group.sample_size(10);
    group.bench_function("complete_3x3", |b| {
        b.iter(|| CompleteSpaceExplorer::new().search(black_box(&initial), &goal))
    });
    group.finish();
}

/// Benchmark building each octree backend and querying every point.
fn bench_octree(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let points: Vec<Vec3> = (0..5000)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
            )
        })
        .collect();

    let mut group = c.benchmark_group("octree");
    for backend in [OctreeBackend::Pointer, OctreeBackend::Flat] {
        group.bench_with_input(
            BenchmarkId::new("build_and_query", format!("{backend:?}")),
            &points,
            |b, points| {
                b.iter(|| {
                    let index = backend.build(black_box(points));
                    points
                        .iter()
                        .map(|&point| index.force_on(point, 10.0, 0.5))
                        .sum::<Vec3>()
                })
            },
        );
    }
    group.finish();
}

/// Benchmark the force layout over the bounded visualization dataset.
fn bench_layout(c: &mut Criterion) {
    let initial = EightPuzzle::solved();
    let nodes = BreadthFirstSearch::with_depth_limit(DEFAULT_VISUALIZATION_DEPTH / 2)
        .search(&initial, &demo_goal())
        .nodes;

    let mut group = c.benchmark_group("force_layout");
    group.sample_size(10);
    for (name, repulsion, execution) in [
        ("barnes_hut", Repulsion::BarnesHut, Execution::Sequential),
        ("barnes_hut_parallel", Repulsion::BarnesHut, Execution::Parallel),
        ("naive", Repulsion::Naive, Execution::Sequential),
    ] {
        let layout = ForceDirectedLayout::new(LayoutConfig {
            max_iterations: 20,
            repulsion,
            execution,
            ..LayoutConfig::default()
        });
        group.bench_function(name, |b| {
            b.iter(|| layout.layout(black_box(&nodes), &initial))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_bfs,
    bench_complete_exploration,
    bench_octree,
    bench_layout
);
criterion_main!(benches);
