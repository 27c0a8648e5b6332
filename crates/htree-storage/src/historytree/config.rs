//! Configuration for the history tree.
//!
//! The geometry (`block_size`, `max_children`) is fixed when a tree is
//! created and recorded in the file header; opening a file rebuilds the
//! configuration from that header.

use htree_common::constants::{
    DEFAULT_BLOCK_SIZE, DEFAULT_MAX_CHILDREN, DEFAULT_NODE_CACHE_CAPACITY, HISTORY_FILE_MAGIC,
    HISTORY_FILE_VERSION, NODE_COMMON_HEADER_SIZE, TREE_HEADER_SIZE,
};
use serde::{Deserialize, Serialize};

use super::error::{HistoryTreeError, HistoryTreeResult};

/// Configuration for a history tree instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Size of every node block in bytes (default: 64KB).
    pub block_size: usize,

    /// Maximum number of children of a core node.
    pub max_children: usize,

    /// Version of the component producing the intervals.
    pub provider_version: i32,

    /// Earliest timestamp the tree accepts.
    pub tree_start: i64,

    /// Magic number written to the file header.
    pub magic: i32,

    /// File format version written to the file header.
    pub file_version: i32,

    /// Number of sealed nodes kept in memory after a read or write.
    pub node_cache_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_children: DEFAULT_MAX_CHILDREN,
            provider_version: 0,
            tree_start: 0,
            magic: HISTORY_FILE_MAGIC,
            file_version: HISTORY_FILE_VERSION,
            node_cache_capacity: DEFAULT_NODE_CACHE_CAPACITY,
        }
    }
}

impl TreeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the maximum number of children per core node.
    pub fn with_max_children(mut self, max_children: usize) -> Self {
        self.max_children = max_children;
        self
    }

    /// Sets the provider version.
    pub fn with_provider_version(mut self, version: i32) -> Self {
        self.provider_version = version;
        self
    }

    /// Sets the tree start time.
    pub fn with_tree_start(mut self, start: i64) -> Self {
        self.tree_start = start;
        self
    }

    /// Sets the magic number.
    pub fn with_magic(mut self, magic: i32) -> Self {
        self.magic = magic;
        self
    }

    /// Sets the file format version.
    pub fn with_file_version(mut self, version: i32) -> Self {
        self.file_version = version;
        self
    }

    /// Sets the node cache capacity.
    pub fn with_node_cache_capacity(mut self, capacity: usize) -> Self {
        self.node_cache_capacity = capacity;
        self
    }

    /// Header size of a leaf node.
    pub fn leaf_header_size(&self) -> usize {
        NODE_COMMON_HEADER_SIZE
    }

    /// Header size of a core node: the common header, the child count and
    /// one slot per possible child.
    pub fn core_header_size(&self) -> usize {
        NODE_COMMON_HEADER_SIZE + 4 + 4 * self.max_children
    }

    /// Largest serialized interval any node of this tree can hold.
    ///
    /// Core nodes have the larger header, so an interval that fits an empty
    /// core node fits an empty node of either kind.
    pub fn max_interval_size(&self) -> usize {
        self.block_size.saturating_sub(self.core_header_size())
    }

    /// Checks that a tree can be built with this configuration.
    pub fn validate(&self) -> HistoryTreeResult<()> {
        if self.block_size < TREE_HEADER_SIZE {
            return Err(HistoryTreeError::invalid_config(format!(
                "block size {} is smaller than the header size {}",
                self.block_size, TREE_HEADER_SIZE
            )));
        }
        if i32::try_from(self.block_size).is_err() {
            return Err(HistoryTreeError::invalid_config(format!(
                "block size {} does not fit the file header",
                self.block_size
            )));
        }
        // A new root must hold the old root and the path to the new leaf
        if self.max_children < 2 {
            return Err(HistoryTreeError::invalid_config(format!(
                "max children must be at least 2, got {}",
                self.max_children
            )));
        }
        if self.core_header_size() >= self.block_size {
            return Err(HistoryTreeError::invalid_config(format!(
                "{} children do not fit a {} byte block",
                self.max_children, self.block_size
            )));
        }
        Ok(())
    }
}

/// Preset configurations.
impl TreeConfig {
    /// Creates a test configuration with the smallest legal blocks.
    pub fn for_testing() -> Self {
        Self {
            block_size: TREE_HEADER_SIZE,
            max_children: 3,
            node_cache_capacity: 16,
            ..Self::default()
        }
    }
}
