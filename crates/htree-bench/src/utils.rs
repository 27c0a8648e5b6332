//! Benchmark utilities and helpers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use htree_storage::{BasicCodec, BasicInterval, HistoryTree, HistoryTreeResult, TreeConfig};

/// Generates intervals with increasing start times and random durations.
pub fn generate_intervals(count: usize, max_duration: i64, value_size: usize) -> Vec<BasicInterval> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut time = 0i64;
    (0..count)
        .map(|_| {
            time += rng.gen_range(1..10);
            let end = time + rng.gen_range(0..=max_duration);
            let value: Vec<u8> = (0..value_size).map(|_| rng.gen()).collect();
            BasicInterval::new(time, end, rng.gen_range(0..32), value)
        })
        .collect()
}

/// Builds a tree holding `intervals` in a fresh temporary directory.
///
/// The tree is closed at its end time when `seal` is set.
pub fn build_tree(
    config: TreeConfig,
    intervals: &[BasicInterval],
    seal: bool,
) -> HistoryTreeResult<(TempDir, HistoryTree<BasicCodec>)> {
    let dir = TempDir::new()?;
    let tree = HistoryTree::create(dir.path().join("bench.ht"), config, BasicCodec)?;
    for interval in intervals {
        tree.insert(interval.clone())?;
    }
    if seal {
        tree.close_tree(tree.tree_end())?;
    }
    Ok((dir, tree))
}
