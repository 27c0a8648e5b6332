//! Helpers shared by the integration tests.

use std::path::PathBuf;

use tempfile::TempDir;

use htree_common::types::TimeRangeCondition;
use htree_storage::{
    BasicCodec, BasicInterval, HistoryTree, HistoryTreeResult, TreeConfig,
};

/// A history tree living in its own temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct TreeFixture {
    /// The tree under test.
    pub tree: HistoryTree<BasicCodec>,
    dir: TempDir,
}

impl TreeFixture {
    /// Creates a tree with 4 KB blocks and `max_children` children per core
    /// node.
    pub fn new(max_children: usize) -> HistoryTreeResult<Self> {
        Self::with_config(TreeConfig::for_testing().with_max_children(max_children))
    }

    /// Creates a tree with the given configuration.
    pub fn with_config(config: TreeConfig) -> HistoryTreeResult<Self> {
        let dir = TempDir::new()?;
        let tree = HistoryTree::create(dir.path().join("tree.ht"), config, BasicCodec)?;
        Ok(Self { tree, dir })
    }

    /// Path of the history file.
    pub fn path(&self) -> PathBuf {
        self.tree.path().to_path_buf()
    }

    /// Path of another file in the fixture's directory.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Inserts every interval.
    pub fn insert_all(&self, intervals: &[BasicInterval]) -> HistoryTreeResult<()> {
        for interval in intervals {
            self.tree.insert(interval.clone())?;
        }
        Ok(())
    }

    /// Seals the tree and reopens the file read-only.
    pub fn close_and_reopen(&self, end: i64) -> HistoryTreeResult<HistoryTree<BasicCodec>> {
        self.tree.close_tree(end)?;
        let expected = self.tree.config().clone();
        HistoryTree::open_with_config(self.path(), &expected, BasicCodec)
    }
}

/// Intervals of `all` intersecting `condition`, computed by brute force.
pub fn brute_force(all: &[BasicInterval], condition: &TimeRangeCondition) -> Vec<BasicInterval> {
    all.iter()
        .filter(|i| condition.intersects(i.start, i.end))
        .cloned()
        .collect()
}

/// Sorts intervals into a canonical order so result sets can be compared.
pub fn canonical(mut intervals: Vec<BasicInterval>) -> Vec<BasicInterval> {
    intervals.sort_by(|a, b| {
        (a.start, a.end, a.attribute, &a.value).cmp(&(b.start, b.end, b.attribute, &b.value))
    });
    intervals
}
