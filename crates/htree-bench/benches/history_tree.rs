//! History tree benchmarks.
//!
//! Benchmarks for:
//! - Inserts with small and default block sizes
//! - Inserts with narrow and wide fan-out
//! - Point and range queries on an open tree
//! - Range queries on a sealed, reopened tree (cold node reads)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use htree_bench::utils::{build_tree, generate_intervals};
use htree_common::types::TimeRangeCondition;
use htree_storage::{BasicCodec, HistoryTree, TreeConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Benchmark inserts across block sizes.
fn bench_insert_block_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("htree/insert_block_size");
    let intervals = generate_intervals(20_000, 100, 16);

    for block_size in [4096usize, 16 * 1024, 64 * 1024] {
        let config = TreeConfig::default()
            .with_block_size(block_size)
            .with_max_children(16);

        group.throughput(Throughput::Elements(intervals.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &config,
            |b, config| {
                b.iter(|| {
                    let (_dir, tree) = build_tree(config.clone(), &intervals, false).unwrap();
                    black_box(tree.node_count())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark inserts across fan-outs.
fn bench_insert_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("htree/insert_fanout");
    let intervals = generate_intervals(20_000, 100, 16);

    for max_children in [2usize, 10, 50] {
        let config = TreeConfig::for_testing().with_max_children(max_children);

        group.throughput(Throughput::Elements(intervals.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(max_children),
            &config,
            |b, config| {
                b.iter(|| {
                    let (_dir, tree) = build_tree(config.clone(), &intervals, false).unwrap();
                    black_box(tree.depth())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark point queries on a tree still receiving data.
fn bench_point_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("htree/point_query");

    for size in [10_000usize, 100_000] {
        let intervals = generate_intervals(size, 100, 16);
        let (_dir, tree) =
            build_tree(TreeConfig::for_testing().with_max_children(10), &intervals, false).unwrap();
        let end = tree.tree_end();
        let mut rng = StdRng::seed_from_u64(42);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let at = rng.gen_range(0..end);
                let found = tree.query(TimeRangeCondition::singleton(at)).unwrap();
                black_box(found.len())
            });
        });
    }

    group.finish();
}

/// Benchmark range queries of growing width on a sealed tree read from disk.
fn bench_range_query_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("htree/range_query_cold");
    let intervals = generate_intervals(100_000, 100, 16);
    let config = TreeConfig::for_testing()
        .with_max_children(10)
        .with_node_cache_capacity(0);
    let (_dir, tree) = build_tree(config.clone(), &intervals, true).unwrap();
    let reopened = HistoryTree::open_with_config(tree.path(), &config, BasicCodec).unwrap();
    let end = reopened.tree_end();

    for width in [100i64, 10_000, 100_000] {
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                let low = rng.gen_range(0..end);
                let found = reopened
                    .get_matching_intervals(TimeRangeCondition::range(low, low + width), |i| {
                        i.attribute < 8
                    })
                    .count();
                black_box(found)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_block_size,
    bench_insert_fanout,
    bench_point_query,
    bench_range_query_cold,
);

criterion_main!(benches);
