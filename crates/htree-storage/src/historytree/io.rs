//! Block I/O for history files.
//!
//! Node `n` lives at `TREE_HEADER_SIZE + n * block_size`, so the file is an
//! append-only run of fixed-size blocks addressed by sequence number.
//!
//! ```text
//! ┌────────────┬──────────┬──────────┬──────────┬─────┐
//! │   header   │  node 0  │  node 1  │  node 2  │ ... │
//! │ 4096 bytes │  block   │  block   │  block   │     │
//! └────────────┴──────────┴──────────┴──────────┴─────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use htree_common::constants::TREE_HEADER_SIZE;
use htree_common::types::SeqNum;
use tracing::{debug, trace};

use crate::file::{FileHandle, IoError, OpenOptions, StandardFile};

use super::cache::{CacheStats, NodeCache};
use super::config::TreeConfig;
use super::error::{HistoryTreeError, HistoryTreeResult};
use super::header::TreeHeader;
use super::interval::IntervalCodec;
use super::node::HtNode;

/// Reads and writes the blocks of one history file.
pub struct TreeIo<C: IntervalCodec> {
    file: StandardFile,
    codec: Arc<C>,
    config: TreeConfig,
    cache: NodeCache<C::Interval>,
}

impl<C: IntervalCodec> TreeIo<C> {
    /// Creates the file, discarding any previous content.
    pub fn create(path: &Path, config: &TreeConfig, codec: Arc<C>) -> HistoryTreeResult<Self> {
        let file = StandardFile::open(path, OpenOptions::for_truncate())?;
        debug!(path = %path.display(), "created history file");
        Ok(Self::with_file(file, config, codec))
    }

    /// Opens an existing file for reading.
    pub fn open(path: &Path, config: &TreeConfig, codec: Arc<C>) -> HistoryTreeResult<Self> {
        let file = StandardFile::open(path, OpenOptions::for_read())?;
        Ok(Self::with_file(file, config, codec))
    }

    fn with_file(file: StandardFile, config: &TreeConfig, codec: Arc<C>) -> Self {
        Self {
            file,
            codec,
            config: config.clone(),
            cache: NodeCache::new(config.node_cache_capacity),
        }
    }

    /// Reads and decodes the header of the file at `path`.
    ///
    /// Missing, empty and truncated files are reported as invalid files.
    pub fn read_header(path: &Path) -> HistoryTreeResult<TreeHeader> {
        let file = match StandardFile::open(path, OpenOptions::for_read()) {
            Ok(file) => file,
            Err(e) if e.is_not_found() => {
                return Err(HistoryTreeError::invalid_file(path, "file does not exist"))
            }
            Err(e) => return Err(e.into()),
        };

        let size = file.size()?;
        if size == 0 {
            return Err(HistoryTreeError::invalid_file(path, "empty file"));
        }
        if size < TREE_HEADER_SIZE as u64 {
            return Err(HistoryTreeError::invalid_file(
                path,
                format!("file is {size} bytes, shorter than its {TREE_HEADER_SIZE} byte header"),
            ));
        }

        let mut buf = vec![0u8; TREE_HEADER_SIZE];
        file.read_exact_at(&mut buf, 0)?;
        TreeHeader::decode(&buf)
            .map_err(|e| HistoryTreeError::invalid_file(path, e.to_string()))
    }

    /// Byte offset of a node's block.
    pub fn node_offset(&self, seq: SeqNum) -> HistoryTreeResult<u64> {
        let index = seq.block_index().ok_or(HistoryTreeError::NodeNotFound(seq))?;
        Ok(TREE_HEADER_SIZE as u64 + index * self.config.block_size as u64)
    }

    /// Reads a sealed node, from the cache if possible.
    pub fn read_node(&self, seq: SeqNum) -> HistoryTreeResult<Arc<HtNode<C::Interval>>> {
        if let Some(node) = self.cache.get(seq) {
            return Ok(node);
        }

        let offset = self.node_offset(seq)?;
        let mut buf = vec![0u8; self.config.block_size];
        match self.file.read_exact_at(&mut buf, offset) {
            Ok(()) => {}
            Err(IoError::ShortIo { .. }) => return Err(HistoryTreeError::NodeNotFound(seq)),
            Err(e) => return Err(e.into()),
        }

        let node = HtNode::decode(Bytes::from(buf), self.codec.as_ref(), &self.config)?;
        if node.seq() != seq {
            return Err(HistoryTreeError::invariant(format!(
                "block of node {seq} holds node {}",
                node.seq()
            )));
        }
        trace!(seq = %seq, "read node from disk");

        let node = Arc::new(node);
        self.cache.insert(Arc::clone(&node));
        Ok(node)
    }

    /// Writes a closed node to its block and marks it on disk.
    pub fn write_node(&self, node: &Arc<HtNode<C::Interval>>) -> HistoryTreeResult<()> {
        let block = node.encode(self.codec.as_ref())?;
        if block.len() != self.config.block_size {
            return Err(HistoryTreeError::invariant(format!(
                "node {} encoded to {} bytes, block size is {}",
                node.seq(),
                block.len(),
                self.config.block_size
            )));
        }

        let offset = self.node_offset(node.seq())?;
        self.file.write_all_at(&block, offset)?;
        node.mark_on_disk();
        self.cache.insert(Arc::clone(node));
        trace!(seq = %node.seq(), offset, "wrote node");
        Ok(())
    }

    /// Writes the file header.
    pub fn write_header(&self, header: &TreeHeader) -> HistoryTreeResult<()> {
        self.file.write_all_at(&header.encode(), 0)?;
        Ok(())
    }

    /// Current file size in bytes.
    pub fn file_size(&self) -> HistoryTreeResult<u64> {
        Ok(self.file.size()?)
    }

    /// Node cache statistics.
    pub fn cache_stats(&self) -> &CacheStats {
        self.cache.stats()
    }

    /// Number of nodes currently cached.
    pub fn cached_nodes(&self) -> usize {
        self.cache.len()
    }

    /// Flushes the file to disk.
    pub fn sync(&self) -> HistoryTreeResult<()> {
        Ok(self.file.sync()?)
    }

    /// Flushes and releases the file.
    pub fn close(self) -> HistoryTreeResult<()> {
        self.cache.clear();
        self.file.sync()?;
        debug!(path = %self.file.path().display(), "closed history file");
        Ok(())
    }
}
