//! History file header.
//!
//! The first `TREE_HEADER_SIZE` bytes of a history file describe the tree.
//! The header is written once, when the tree is closed.
//!
//! ```text
//! Offset  Size  Field
//! 0       4     magic
//! 4       4     file format version
//! 8       4     provider version
//! 12      4     block size
//! 16      4     max children
//! 20      4     node count
//! 24      4     root sequence number
//! 28      8     tree start
//! 36      ...   zero padding up to TREE_HEADER_SIZE
//! ```

use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use htree_common::constants::{IGNORE_PROVIDER_VERSION, TREE_HEADER_SIZE};
use htree_common::types::SeqNum;
use serde::Serialize;

use super::config::TreeConfig;
use super::error::{HistoryTreeError, HistoryTreeResult};

/// Decoded history file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeHeader {
    /// Magic number.
    pub magic: i32,
    /// File format version.
    pub file_version: i32,
    /// Version of the provider that built the file.
    pub provider_version: i32,
    /// Node block size.
    pub block_size: i32,
    /// Maximum children per core node.
    pub max_children: i32,
    /// Number of nodes in the file.
    pub node_count: i32,
    /// Root node.
    pub root_seq: SeqNum,
    /// Start time of the tree.
    pub tree_start: i64,
}

impl TreeHeader {
    /// Bytes used by the header fields.
    pub const ENCODED_SIZE: usize = 7 * 4 + 8;

    /// Builds the header describing a tree with this configuration.
    pub fn new(config: &TreeConfig, node_count: usize, root_seq: SeqNum) -> Self {
        Self {
            magic: config.magic,
            file_version: config.file_version,
            provider_version: config.provider_version,
            block_size: config.block_size as i32,
            max_children: config.max_children as i32,
            node_count: node_count as i32,
            root_seq,
            tree_start: config.tree_start,
        }
    }

    /// Serializes the header into a zero-padded `TREE_HEADER_SIZE` block.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TREE_HEADER_SIZE);
        buf.put_i32_le(self.magic);
        buf.put_i32_le(self.file_version);
        buf.put_i32_le(self.provider_version);
        buf.put_i32_le(self.block_size);
        buf.put_i32_le(self.max_children);
        buf.put_i32_le(self.node_count);
        buf.put_i32_le(self.root_seq.as_i32());
        buf.put_i64_le(self.tree_start);
        buf.resize(TREE_HEADER_SIZE, 0);
        buf.freeze()
    }

    /// Reads the header fields from the start of `data`.
    pub fn decode(mut data: &[u8]) -> HistoryTreeResult<Self> {
        if data.len() < Self::ENCODED_SIZE {
            return Err(HistoryTreeError::deserialization(format!(
                "header needs {} bytes, got {}",
                Self::ENCODED_SIZE,
                data.len()
            )));
        }
        Ok(Self {
            magic: data.get_i32_le(),
            file_version: data.get_i32_le(),
            provider_version: data.get_i32_le(),
            block_size: data.get_i32_le(),
            max_children: data.get_i32_le(),
            node_count: data.get_i32_le(),
            root_seq: SeqNum::new(data.get_i32_le()),
            tree_start: data.get_i64_le(),
        })
    }

    /// Checks the header against what the caller expects.
    ///
    /// `expected` supplies the magic number, the file format version and the
    /// provider version; its geometry is ignored. A provider version of
    /// `IGNORE_PROVIDER_VERSION` accepts any provider.
    pub fn validate(&self, path: &Path, expected: &TreeConfig) -> HistoryTreeResult<()> {
        if self.magic != expected.magic {
            return Err(HistoryTreeError::invalid_file(path, "wrong magic number"));
        }
        if self.file_version != expected.file_version {
            return Err(HistoryTreeError::invalid_file(
                path,
                format!(
                    "file format version {} does not match {}",
                    self.file_version, expected.file_version
                ),
            ));
        }
        if expected.provider_version != IGNORE_PROVIDER_VERSION
            && self.provider_version != expected.provider_version
        {
            return Err(HistoryTreeError::ProviderVersionMismatch {
                expected: expected.provider_version,
                found: self.provider_version,
            });
        }
        if self.node_count < 1 {
            return Err(HistoryTreeError::invalid_file(
                path,
                format!("invalid node count {}", self.node_count),
            ));
        }
        if !self.root_seq.is_valid() || self.root_seq.as_i32() >= self.node_count {
            return Err(HistoryTreeError::invalid_file(
                path,
                format!(
                    "root {} outside of {} nodes",
                    self.root_seq, self.node_count
                ),
            ));
        }
        Ok(())
    }

    /// Configuration of the tree this header describes.
    ///
    /// Geometry and start time come from the header; the remaining settings
    /// are taken from `base`.
    pub fn tree_config(&self, path: &Path, base: &TreeConfig) -> HistoryTreeResult<TreeConfig> {
        let block_size = usize::try_from(self.block_size).map_err(|_| {
            HistoryTreeError::invalid_file(path, format!("invalid block size {}", self.block_size))
        })?;
        let max_children = usize::try_from(self.max_children).map_err(|_| {
            HistoryTreeError::invalid_file(
                path,
                format!("invalid max children {}", self.max_children),
            )
        })?;

        let config = base
            .clone()
            .with_block_size(block_size)
            .with_max_children(max_children)
            .with_provider_version(self.provider_version)
            .with_tree_start(self.tree_start)
            .with_magic(self.magic)
            .with_file_version(self.file_version);
        config
            .validate()
            .map_err(|e| HistoryTreeError::invalid_file(path, e.to_string()))?;
        Ok(config)
    }
}
