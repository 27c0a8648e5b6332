//! The history tree coordinator.
//!
//! Owns the file, allocates nodes, keeps the latest branch and runs the
//! insertion algorithm.
//!
//! ```text
//!                    ┌──────────┐
//!                    │ root  #4 │ ◀── latest branch
//!                    └────┬─────┘
//!             ┌───────────┴──────────┐
//!        ┌────┴─────┐           ┌────┴─────┐
//!        │ core  #1 │ (sealed)  │ core  #5 │ ◀──
//!        └────┬─────┘           └────┬─────┘
//!     ┌───────┼────────┐             │
//!  ┌──┴─┐  ┌──┴─┐  ┌───┴┐         ┌──┴─┐
//!  │ #0 │  │ #2 │  │ #3 │         │ #6 │ ◀── the only writable leaf
//!  └────┘  └────┘  └────┘         └────┘
//! ```
//!
//! Inserts are serialized by one writer lock. The latest branch has its own
//! mutex, taken only for lookups and structural changes, and every node has
//! its own lock, so queries keep running while the writer adds intervals.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use htree_common::types::SeqNum;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::file::IoError;

use super::branch::LatestBranch;
use super::config::TreeConfig;
use super::error::{HistoryTreeError, HistoryTreeResult};
use super::header::TreeHeader;
use super::interval::{HtInterval, IntervalCodec};
use super::io::TreeIo;
use super::node::HtNode;

/// Where the insertion state machine stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Try the node at this depth of the latest branch.
    Inserting { depth: usize },
    /// The node at this depth is full: start a new branch there.
    NeedSibling { depth: usize },
    /// No level can take a new branch: grow the tree by one level.
    NeedNewRoot,
}

/// A disk-backed tree of time intervals.
pub struct HistoryTree<C: IntervalCodec> {
    config: TreeConfig,
    path: PathBuf,
    codec: Arc<C>,
    /// Serializes inserts and lifecycle operations.
    write_lock: Mutex<()>,
    branch: Mutex<LatestBranch<C::Interval>>,
    /// `None` once the file is closed or deleted.
    io: RwLock<Option<TreeIo<C>>>,
    tree_end: AtomicI64,
    node_count: AtomicUsize,
    read_only: AtomicBool,
}

impl<C: IntervalCodec> HistoryTree<C> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Creates a new, empty tree, truncating any file at `path`.
    pub fn create(path: impl AsRef<Path>, config: TreeConfig, codec: C) -> HistoryTreeResult<Self> {
        config.validate()?;
        let path = path.as_ref().to_path_buf();
        let codec = Arc::new(codec);
        let io = TreeIo::create(&path, &config, Arc::clone(&codec))?;

        let root = Arc::new(HtNode::new_leaf(
            SeqNum::FIRST,
            SeqNum::NONE,
            config.tree_start,
            &config,
        ));

        info!(
            path = %path.display(),
            block_size = config.block_size,
            max_children = config.max_children,
            tree_start = config.tree_start,
            "created history tree"
        );

        Ok(Self {
            tree_end: AtomicI64::new(config.tree_start),
            node_count: AtomicUsize::new(1),
            branch: Mutex::new(LatestBranch::new(root)),
            io: RwLock::new(Some(io)),
            read_only: AtomicBool::new(false),
            write_lock: Mutex::new(()),
            codec,
            path,
            config,
        })
    }

    /// Opens a tree written by [`HistoryTree::close_tree`].
    ///
    /// The file must carry the default magic number and format version and
    /// have been built with `expected_provider_version`. The reopened tree
    /// is read-only.
    pub fn open(
        path: impl AsRef<Path>,
        expected_provider_version: i32,
        codec: C,
    ) -> HistoryTreeResult<Self> {
        let expected = TreeConfig::default().with_provider_version(expected_provider_version);
        Self::open_with_config(path, &expected, codec)
    }

    /// Opens a tree, checking its header against `expected`.
    ///
    /// Magic number, format version and provider version come from
    /// `expected`, as does the node cache capacity. Geometry and start time
    /// come from the file.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        expected: &TreeConfig,
        codec: C,
    ) -> HistoryTreeResult<Self> {
        let path = path.as_ref();
        let result = Self::open_inner(path, expected, codec);
        if let Err(e) = &result {
            warn!(path = %path.display(), error = %e, "rejected history file");
        }
        result
    }

    fn open_inner(path: &Path, expected: &TreeConfig, codec: C) -> HistoryTreeResult<Self> {
        let header = TreeIo::<C>::read_header(path)?;
        header.validate(path, expected)?;
        let config = header.tree_config(path, expected)?;
        let node_count = header.node_count as usize;

        let codec = Arc::new(codec);
        let io = TreeIo::open(path, &config, Arc::clone(&codec))?;
        let branch = Self::rebuild_latest_branch(&io, path, header.root_seq, node_count)?;

        let root = branch.root();
        if root.start() != header.tree_start {
            return Err(HistoryTreeError::invalid_file(
                path,
                format!(
                    "inconsistent start times: header has {}, root has {}",
                    header.tree_start,
                    root.start()
                ),
            ));
        }
        let tree_end = root.node_end();

        info!(
            path = %path.display(),
            node_count,
            depth = branch.depth(),
            tree_start = config.tree_start,
            tree_end,
            "opened history tree"
        );

        Ok(Self {
            tree_end: AtomicI64::new(tree_end),
            node_count: AtomicUsize::new(node_count),
            branch: Mutex::new(branch),
            io: RwLock::new(Some(io)),
            read_only: AtomicBool::new(true),
            write_lock: Mutex::new(()),
            path: path.to_path_buf(),
            codec,
            config,
        })
    }

    /// Reads the header of a history file without opening the tree.
    pub fn read_header(path: impl AsRef<Path>) -> HistoryTreeResult<TreeHeader> {
        TreeIo::<C>::read_header(path.as_ref())
    }

    /// Reads the root, then follows the latest child of each level down to
    /// a leaf.
    fn rebuild_latest_branch(
        io: &TreeIo<C>,
        path: &Path,
        root_seq: SeqNum,
        node_count: usize,
    ) -> HistoryTreeResult<LatestBranch<C::Interval>> {
        let mut node = io.read_node(root_seq)?;
        let mut branch = LatestBranch::new(Arc::clone(&node));

        while !node.is_leaf() {
            let child = node.latest_child().ok_or_else(|| {
                HistoryTreeError::invalid_file(
                    path,
                    format!("core node {} has no children", node.seq()),
                )
            })?;
            if branch.depth() >= node_count {
                return Err(HistoryTreeError::invalid_file(
                    path,
                    "latest branch is deeper than the node count",
                ));
            }
            node = io.read_node(child)?;
            branch.push(Arc::clone(&node));
        }
        Ok(branch)
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Inserts an interval.
    ///
    /// The interval lands in the deepest node of the latest branch that
    /// starts no later than it does and has room for it. Full nodes are
    /// replaced by a new branch, and the tree grows a level when no node
    /// above can take one.
    pub fn insert(&self, interval: C::Interval) -> HistoryTreeResult<()> {
        let _writer = self.write_lock.lock();
        if self.read_only.load(Ordering::Acquire) {
            return Err(HistoryTreeError::ReadOnly);
        }

        if interval.end() < interval.start() {
            return Err(HistoryTreeError::InvalidInterval {
                start: interval.start(),
                end: interval.end(),
            });
        }
        let tree_start = self.config.tree_start;
        if interval.start() < tree_start {
            return Err(HistoryTreeError::IntervalBeforeTreeStart {
                start: interval.start(),
                tree_start,
            });
        }

        let size = self.codec.encoded_size(&interval);
        let max = self.config.max_interval_size();
        if size > max {
            return Err(HistoryTreeError::IntervalTooLarge { size, max });
        }

        let io_guard = self.io.read();
        let io = io_guard.as_ref().ok_or(HistoryTreeError::Closed)?;

        let mut state = Placement::Inserting {
            depth: self.branch.lock().leaf_depth(),
        };
        loop {
            state = match state {
                Placement::Inserting { depth } => {
                    let node = self.branch_node(depth)?;
                    if size > node.free_space() {
                        Placement::NeedSibling { depth }
                    } else if interval.start() < node.start() {
                        if depth == 0 {
                            // The root always starts at the tree start
                            return Err(self.fatal(HistoryTreeError::invariant(format!(
                                "interval start {} precedes root start {}",
                                interval.start(),
                                node.start()
                            ))));
                        }
                        Placement::Inserting { depth: depth - 1 }
                    } else {
                        let end = interval.end();
                        node.add(interval, size)?;
                        self.tree_end.fetch_max(end, Ordering::AcqRel);
                        return Ok(());
                    }
                }
                Placement::NeedSibling { depth } => self.add_sibling(io, depth)?,
                Placement::NeedNewRoot => {
                    self.add_new_root(io)?;
                    Placement::Inserting {
                        depth: self.branch.lock().leaf_depth(),
                    }
                }
            };
        }
    }

    /// Starts a new branch at `depth`, or decides it must start higher.
    fn add_sibling(&self, io: &TreeIo<C>, depth: usize) -> HistoryTreeResult<Placement> {
        if depth == 0 {
            return Ok(Placement::NeedNewRoot);
        }

        let split_time = self.tree_end();
        let parent = self.branch_node(depth - 1)?;
        if parent.is_full_of_children() || split_time < parent.start() {
            return Ok(Placement::NeedSibling { depth: depth - 1 });
        }

        let leaf_depth = self.split_branch(io, depth, split_time)?;
        Ok(Placement::Inserting { depth: leaf_depth })
    }

    /// Seals the branch from the leaf up to `depth` and replaces those
    /// levels with new empty nodes starting at `split_time`.
    fn split_branch(
        &self,
        io: &TreeIo<C>,
        depth: usize,
        split_time: i64,
    ) -> HistoryTreeResult<usize> {
        let mut branch = self.branch.lock();
        let leaf_depth = branch.leaf_depth();

        for d in (depth..=leaf_depth).rev() {
            let node = Self::level(&branch, d)?;
            self.seal(io, &node, split_time)?;
        }

        for d in depth..=leaf_depth {
            let parent = Self::level(&branch, d - 1)?;
            let node = self.new_node(d == leaf_depth, parent.seq(), split_time);
            parent.link_new_child(node.seq())?;
            branch.replace(d, node);
        }

        debug!(
            depth,
            split_time,
            leaf = %branch.leaf().seq(),
            node_count = self.node_count(),
            "started new branch"
        );
        Ok(leaf_depth)
    }

    /// Seals the whole branch and puts a new root above it.
    ///
    /// The new root starts at the tree start, adopts the old root as its
    /// first child, and gets a fresh path of empty nodes down to a new leaf.
    fn add_new_root(&self, io: &TreeIo<C>) -> HistoryTreeResult<()> {
        let mut branch = self.branch.lock();
        let split_time = self.tree_end();
        let old_root = Arc::clone(branch.root());

        // The root's number is claimed only once the old branch is on disk.
        // The writer lock keeps it from being taken in between.
        let root_seq = SeqNum::new(self.node_count() as i32);
        let new_root = Arc::new(HtNode::new_core(
            root_seq,
            SeqNum::NONE,
            self.config.tree_start,
            &self.config,
        ));
        new_root.link_new_child(old_root.seq())?;
        if new_root.is_full_of_children() {
            return Err(self.fatal(HistoryTreeError::invariant(format!(
                "new root {root_seq} has no room for a branch next to {}",
                old_root.seq()
            ))));
        }

        // The parent must be set before the old root is written
        old_root.set_parent(root_seq)?;
        for node in branch.iter().rev() {
            self.seal(io, node, split_time)?;
        }
        let claimed = self.allocate_seq();
        debug_assert_eq!(claimed, root_seq);

        let depth = branch.depth() + 1;
        let mut new_branch = LatestBranch::new(Arc::clone(&new_root));
        for d in 1..depth {
            let parent = Arc::clone(new_branch.leaf());
            let node = self.new_node(d == depth - 1, parent.seq(), split_time);
            parent.link_new_child(node.seq())?;
            new_branch.push(node);
        }
        *branch = new_branch;

        debug!(
            root = %new_root.seq(),
            depth,
            split_time,
            node_count = self.node_count(),
            "grew tree by one level"
        );
        Ok(())
    }

    fn new_node(&self, leaf: bool, parent: SeqNum, start: i64) -> Arc<HtNode<C::Interval>> {
        let seq = self.allocate_seq();
        Arc::new(if leaf {
            HtNode::new_leaf(seq, parent, start, &self.config)
        } else {
            HtNode::new_core(seq, parent, start, &self.config)
        })
    }

    fn allocate_seq(&self) -> SeqNum {
        SeqNum::new(self.node_count.fetch_add(1, Ordering::AcqRel) as i32)
    }

    /// Closes a node at `end` and writes it.
    fn seal(
        &self,
        io: &TreeIo<C>,
        node: &Arc<HtNode<C::Interval>>,
        end: i64,
    ) -> HistoryTreeResult<()> {
        node.close(end).map_err(|e| self.fatal(e))?;
        io.write_node(node)?;
        debug!(seq = %node.seq(), start = node.start(), end, "sealed node");
        Ok(())
    }

    fn branch_node(&self, depth: usize) -> HistoryTreeResult<Arc<HtNode<C::Interval>>> {
        Self::level(&self.branch.lock(), depth)
    }

    fn level(
        branch: &LatestBranch<C::Interval>,
        depth: usize,
    ) -> HistoryTreeResult<Arc<HtNode<C::Interval>>> {
        branch.get(depth).cloned().ok_or_else(|| {
            HistoryTreeError::invariant(format!(
                "latest branch has no level {depth} (depth {})",
                branch.depth()
            ))
        })
    }

    fn fatal(&self, err: HistoryTreeError) -> HistoryTreeError {
        if matches!(err, HistoryTreeError::InvariantViolation(_)) {
            error!(path = %self.path.display(), error = %err, "history tree invariant broken");
        }
        err
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Seals the latest branch at `end_time` and writes the file header.
    ///
    /// `end_time` becomes the end of the tree and must not precede any
    /// inserted interval. Afterwards the tree is read-only.
    pub fn close_tree(&self, end_time: i64) -> HistoryTreeResult<()> {
        let _writer = self.write_lock.lock();
        if self.read_only.load(Ordering::Acquire) {
            return Err(HistoryTreeError::ReadOnly);
        }
        let io_guard = self.io.read();
        let io = io_guard.as_ref().ok_or(HistoryTreeError::Closed)?;

        let tree_end = self.tree_end();
        if end_time < tree_end {
            return Err(HistoryTreeError::CloseBeforeEnd {
                requested: end_time,
                tree_end,
            });
        }

        let branch = self.branch.lock();
        for node in branch.iter().rev() {
            self.seal(io, node, end_time)?;
        }
        self.tree_end.store(end_time, Ordering::Release);

        let header = TreeHeader::new(&self.config, self.node_count(), branch.root().seq());
        io.write_header(&header)?;
        io.sync()?;
        self.read_only.store(true, Ordering::Release);

        info!(
            path = %self.path.display(),
            end_time,
            node_count = header.node_count,
            depth = branch.depth(),
            "closed history tree"
        );
        Ok(())
    }

    /// Releases the file. Nodes of the latest branch stay queryable; other
    /// nodes can no longer be read.
    pub fn close_file(&self) -> HistoryTreeResult<()> {
        let _writer = self.write_lock.lock();
        let mut io = self.io.write();
        if let Some(io) = io.take() {
            io.close()?;
            info!(path = %self.path.display(), "closed history file");
        }
        Ok(())
    }

    /// Releases and deletes the file.
    pub fn delete_file(&self) -> HistoryTreeResult<()> {
        let _writer = self.write_lock.lock();
        let mut io = self.io.write();
        if let Some(io) = io.take() {
            io.close()?;
        }
        self.remove_file()?;
        self.read_only.store(true, Ordering::Release);
        info!(path = %self.path.display(), "deleted history file");
        Ok(())
    }

    /// Seals what is left of the tree, deletes the file and starts over with
    /// an empty tree of the same configuration.
    pub fn clean_file(&self) -> HistoryTreeResult<()> {
        let _writer = self.write_lock.lock();
        let mut io_guard = self.io.write();
        if let Some(io) = io_guard.take() {
            if !self.is_read_only() {
                let end = self.tree_end();
                for node in self.branch.lock().iter().rev() {
                    self.seal(&io, node, end)?;
                }
            }
            io.close()?;
        }
        self.remove_file()?;

        let io = TreeIo::create(&self.path, &self.config, Arc::clone(&self.codec))?;
        let root = Arc::new(HtNode::new_leaf(
            SeqNum::FIRST,
            SeqNum::NONE,
            self.config.tree_start,
            &self.config,
        ));
        *self.branch.lock() = LatestBranch::new(root);
        self.node_count.store(1, Ordering::Release);
        self.tree_end.store(self.config.tree_start, Ordering::Release);
        self.read_only.store(false, Ordering::Release);
        *io_guard = Some(io);

        info!(path = %self.path.display(), "cleaned history file");
        Ok(())
    }

    fn remove_file(&self) -> HistoryTreeResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IoError::from_io_with_path(e, &self.path).into()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Configuration of this tree.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Path of the history file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Earliest timestamp of the tree.
    pub fn tree_start(&self) -> i64 {
        self.config.tree_start
    }

    /// Latest timestamp covered so far.
    pub fn tree_end(&self) -> i64 {
        self.tree_end.load(Ordering::Acquire)
    }

    /// Number of nodes allocated so far.
    pub fn node_count(&self) -> usize {
        self.node_count.load(Ordering::Acquire)
    }

    /// Size of the history file in bytes.
    pub fn file_size(&self) -> HistoryTreeResult<u64> {
        self.io
            .read()
            .as_ref()
            .ok_or(HistoryTreeError::Closed)?
            .file_size()
    }

    /// Size of a node block in bytes.
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Maximum number of children of a core node.
    pub fn max_children(&self) -> usize {
        self.config.max_children
    }

    /// Version of the interval provider that built the tree.
    pub fn provider_version(&self) -> i32 {
        self.config.provider_version
    }

    /// Number of levels of the tree.
    pub fn depth(&self) -> usize {
        self.branch.lock().depth()
    }

    /// Sequence number of the root.
    pub fn root_seq(&self) -> SeqNum {
        self.branch.lock().root().seq()
    }

    /// Sequence numbers of the latest branch, root first.
    pub fn latest_branch(&self) -> Vec<SeqNum> {
        self.branch.lock().seqs()
    }

    /// Returns true if the tree no longer accepts inserts.
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }

    /// Returns a node, from the latest branch if it is there, from the file
    /// otherwise.
    pub fn read_node(&self, seq: SeqNum) -> HistoryTreeResult<Arc<HtNode<C::Interval>>> {
        if let Some(node) = self.branch.lock().find(seq) {
            return Ok(node);
        }
        if !seq.is_valid() || seq.as_i32() as usize >= self.node_count() {
            return Err(HistoryTreeError::NodeNotFound(seq));
        }
        self.io
            .read()
            .as_ref()
            .ok_or(HistoryTreeError::Closed)?
            .read_node(seq)
    }

    /// Alias of [`HistoryTree::read_node`].
    pub fn node(&self, seq: SeqNum) -> HistoryTreeResult<Arc<HtNode<C::Interval>>> {
        self.read_node(seq)
    }

    /// How full a node is, in percent of its block.
    pub fn node_usage_percent(&self, seq: SeqNum) -> HistoryTreeResult<u8> {
        Ok(self.read_node(seq)?.usage_percent())
    }

    /// Summary of the tree.
    pub fn stats(&self) -> TreeStats {
        let (depth, root, latest_leaf) = {
            let branch = self.branch.lock();
            (branch.depth(), branch.root().seq(), branch.leaf().seq())
        };
        let (file_size, cached_nodes, cache_hits, cache_misses) = match self.io.read().as_ref() {
            Some(io) => (
                io.file_size().ok(),
                io.cached_nodes(),
                io.cache_stats().hits(),
                io.cache_stats().misses(),
            ),
            None => (None, 0, 0, 0),
        };

        TreeStats {
            path: self.path.clone(),
            block_size: self.config.block_size,
            max_children: self.config.max_children,
            provider_version: self.config.provider_version,
            tree_start: self.tree_start(),
            tree_end: self.tree_end(),
            node_count: self.node_count(),
            depth,
            root,
            latest_leaf,
            file_size,
            read_only: self.is_read_only(),
            cached_nodes,
            cache_hits,
            cache_misses,
        }
    }

    /// Walks every node reachable from the root and checks the structural
    /// invariants of the tree. Returns the number of nodes visited.
    ///
    /// Meant for quiescent trees: a concurrent insert can make the check
    /// observe a branch mid-split.
    pub fn check_integrity(&self) -> HistoryTreeResult<usize> {
        let latest = self.latest_branch();
        let leaf = latest[latest.len() - 1];
        let node_count = self.node_count();

        let mut queue = VecDeque::from([(self.root_seq(), None)]);
        let mut visited = 0usize;
        let mut open_leaves = 0usize;

        while let Some((seq, parent)) = queue.pop_front() {
            let node = self.read_node(seq)?;
            visited += 1;
            if visited > node_count {
                return Err(HistoryTreeError::invariant(format!(
                    "more than {node_count} nodes reachable from the root"
                )));
            }

            let info = node.info();
            let end = node.node_end();
            if info.content_size > info.capacity {
                return Err(HistoryTreeError::invariant(format!(
                    "node {seq} holds {} bytes, capacity {}",
                    info.content_size, info.capacity
                )));
            }
            for interval in node.intervals() {
                if interval.start() < info.start || interval.end() > end {
                    return Err(HistoryTreeError::invariant(format!(
                        "node {seq} [{}, {end}] holds interval [{}, {}]",
                        info.start,
                        interval.start(),
                        interval.end()
                    )));
                }
            }

            if !info.on_disk {
                if !latest.contains(&seq) {
                    return Err(HistoryTreeError::invariant(format!(
                        "node {seq} is open but not on the latest branch"
                    )));
                }
                if node.is_leaf() {
                    open_leaves += 1;
                    if seq != leaf {
                        return Err(HistoryTreeError::invariant(format!(
                            "open leaf {seq} is not the latest leaf {leaf}"
                        )));
                    }
                }
            }

            if let Some((parent_seq, parent_start, parent_end)) = parent {
                if info.parent != parent_seq {
                    return Err(HistoryTreeError::invariant(format!(
                        "node {seq} records parent {}, linked from {parent_seq}",
                        info.parent
                    )));
                }
                if info.start < parent_start || end > parent_end {
                    return Err(HistoryTreeError::invariant(format!(
                        "node {seq} [{}, {end}] exceeds parent {parent_seq} [{parent_start}, {parent_end}]",
                        info.start
                    )));
                }
            } else if info.parent.is_valid() {
                return Err(HistoryTreeError::invariant(format!(
                    "root {seq} records parent {}",
                    info.parent
                )));
            }

            for child in info.children {
                queue.push_back((child, Some((seq, info.start, end))));
            }
        }

        if !self.is_read_only() && open_leaves != 1 {
            return Err(HistoryTreeError::invariant(format!(
                "{open_leaves} open leaves, expected exactly one"
            )));
        }
        Ok(visited)
    }
}

impl<C: IntervalCodec> fmt::Debug for HistoryTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryTree")
            .field("path", &self.path)
            .field("tree_start", &self.tree_start())
            .field("tree_end", &self.tree_end())
            .field("node_count", &self.node_count())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

impl<C: IntervalCodec> fmt::Display for HistoryTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stats())
    }
}

// =============================================================================
// Tree Stats
// =============================================================================

/// Summary of a history tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Path of the history file.
    pub path: PathBuf,
    /// Node block size.
    pub block_size: usize,
    /// Maximum children per core node.
    pub max_children: usize,
    /// Provider version.
    pub provider_version: i32,
    /// Start of the tree.
    pub tree_start: i64,
    /// End of the tree.
    pub tree_end: i64,
    /// Number of nodes.
    pub node_count: usize,
    /// Number of levels.
    pub depth: usize,
    /// Root node.
    pub root: SeqNum,
    /// Latest leaf.
    pub latest_leaf: SeqNum,
    /// File size, `None` once the file is closed.
    pub file_size: Option<u64>,
    /// Whether inserts are rejected.
    pub read_only: bool,
    /// Sealed nodes held by the node cache.
    pub cached_nodes: usize,
    /// Node cache hits.
    pub cache_hits: u64,
    /// Node cache misses.
    pub cache_misses: u64,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "History tree {}", self.path.display())?;
        writeln!(f, "  block size:     {}", self.block_size)?;
        writeln!(f, "  max children:   {}", self.max_children)?;
        writeln!(f, "  time range:     [{}, {}]", self.tree_start, self.tree_end)?;
        writeln!(f, "  nodes:          {}", self.node_count)?;
        writeln!(f, "  depth:          {}", self.depth)?;
        writeln!(f, "  root:           {}", self.root)?;
        writeln!(f, "  latest leaf:    {}", self.latest_leaf)?;
        match self.file_size {
            Some(size) => write!(f, "  file size:      {size} bytes"),
            None => write!(f, "  file size:      (closed)"),
        }
    }
}
