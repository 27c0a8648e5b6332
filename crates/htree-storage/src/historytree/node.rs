//! Node layout and format.
//!
//! A node is one fixed-size block of the history file. It holds a run of
//! intervals sorted by `(end, start)` and, for core nodes, the directory of
//! its children.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ type u8 | start i64 | end i64 | seq i32 | parent i32 |        │
//! │ count i32 | reserved u8                    (30 bytes)         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ core only: child count i32 + max_children × i32               │
//! ├───────────────────────────────────────────────────────────────┤
//! │ interval 0 | interval 1 | ... (codec encoded, sorted)         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ zero padding up to block_size                                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! A node is open while it sits on the latest branch. Closing it fixes its
//! end time; writing it marks it on disk, after which it never changes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use htree_common::constants::NODE_COMMON_HEADER_SIZE;
use htree_common::types::{SeqNum, TimeRangeCondition};
use parking_lot::RwLock;
use serde::Serialize;

use super::config::TreeConfig;
use super::core::CoreData;
use super::error::{HistoryTreeError, HistoryTreeResult};
use super::interval::{HtInterval, IntervalCodec};

/// Value of the reserved header byte. Nodes are only written once closed,
/// and older readers expect this byte to say so.
const RESERVED_CLOSED: u8 = 1;

// =============================================================================
// Node Type
// =============================================================================

/// Node type stored in the first byte of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum NodeType {
    /// Internal node with children.
    Core = 1,
    /// Node without children.
    Leaf = 2,
}

impl NodeType {
    /// Converts from the on-disk byte.
    pub fn from_byte(b: u8) -> HistoryTreeResult<Self> {
        match b {
            1 => Ok(Self::Core),
            2 => Ok(Self::Leaf),
            _ => Err(HistoryTreeError::deserialization(format!(
                "invalid node type {b}"
            ))),
        }
    }

    /// Returns the on-disk byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => write!(f, "CORE"),
            Self::Leaf => write!(f, "LEAF"),
        }
    }
}

/// Type-specific part of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf node.
    Leaf,
    /// Core node with its child directory.
    Core(CoreData),
}

impl NodeKind {
    /// The node type tag.
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Leaf => NodeType::Leaf,
            Self::Core(_) => NodeType::Core,
        }
    }

    fn header_size(&self) -> usize {
        match self {
            Self::Leaf => 0,
            Self::Core(core) => core.header_size(),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

struct NodeState<I> {
    kind: NodeKind,
    parent: SeqNum,
    /// Only meaningful once `closed` is set.
    end: i64,
    closed: bool,
    intervals: Vec<I>,
    content_size: usize,
}

/// A node of the history tree.
///
/// Sequence number and start time never change. Everything else lives
/// behind the node's own lock, so queries can read a node while the writer
/// adds to it.
pub struct HtNode<I> {
    seq: SeqNum,
    start: i64,
    block_size: usize,
    on_disk: AtomicBool,
    state: RwLock<NodeState<I>>,
}

impl<I: HtInterval> HtNode<I> {
    fn with_kind(
        seq: SeqNum,
        parent: SeqNum,
        start: i64,
        block_size: usize,
        kind: NodeKind,
    ) -> Self {
        Self {
            seq,
            start,
            block_size,
            on_disk: AtomicBool::new(false),
            state: RwLock::new(NodeState {
                kind,
                parent,
                end: start,
                closed: false,
                intervals: Vec::new(),
                content_size: 0,
            }),
        }
    }

    /// Creates an empty, open leaf node.
    pub fn new_leaf(seq: SeqNum, parent: SeqNum, start: i64, config: &TreeConfig) -> Self {
        Self::with_kind(seq, parent, start, config.block_size, NodeKind::Leaf)
    }

    /// Creates an empty, open core node.
    pub fn new_core(seq: SeqNum, parent: SeqNum, start: i64, config: &TreeConfig) -> Self {
        Self::with_kind(
            seq,
            parent,
            start,
            config.block_size,
            NodeKind::Core(CoreData::new(config.max_children)),
        )
    }

    /// Sequence number of this node.
    #[inline]
    pub fn seq(&self) -> SeqNum {
        self.seq
    }

    /// Start time of this node.
    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// End time of this node, or `i64::MAX` while it is still open.
    pub fn node_end(&self) -> i64 {
        let state = self.state.read();
        if state.closed {
            state.end
        } else {
            i64::MAX
        }
    }

    /// Sequence number of the parent, `SeqNum::NONE` for the root.
    pub fn parent(&self) -> SeqNum {
        self.state.read().parent
    }

    /// Records the parent of a node that was the root until now.
    ///
    /// A node's parent can be set at most once after creation.
    pub fn set_parent(&self, parent: SeqNum) -> HistoryTreeResult<()> {
        let mut state = self.state.write();
        if state.parent.is_valid() {
            return Err(HistoryTreeError::invariant(format!(
                "node {} already has parent {}",
                self.seq, state.parent
            )));
        }
        if self.is_on_disk() {
            return Err(HistoryTreeError::invariant(format!(
                "node {} is already on disk",
                self.seq
            )));
        }
        state.parent = parent;
        Ok(())
    }

    /// The node type.
    pub fn node_type(&self) -> NodeType {
        self.state.read().kind.node_type()
    }

    /// Returns true for leaf nodes.
    pub fn is_leaf(&self) -> bool {
        self.node_type() == NodeType::Leaf
    }

    /// Returns true once the end time is fixed.
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    /// Returns true once the node has been written to the file.
    #[inline]
    pub fn is_on_disk(&self) -> bool {
        self.on_disk.load(Ordering::Acquire)
    }

    pub(crate) fn mark_on_disk(&self) {
        self.on_disk.store(true, Ordering::Release);
    }

    /// Number of intervals in this node.
    pub fn interval_count(&self) -> usize {
        self.state.read().intervals.len()
    }

    /// Bytes used by the intervals.
    pub fn content_size(&self) -> usize {
        self.state.read().content_size
    }

    /// Size of the common and type-specific headers.
    pub fn total_header_size(&self) -> usize {
        NODE_COMMON_HEADER_SIZE + self.state.read().kind.header_size()
    }

    /// Bytes still available for intervals.
    pub fn free_space(&self) -> usize {
        let state = self.state.read();
        Self::free_space_of(self.block_size, &state)
    }

    fn free_space_of(block_size: usize, state: &NodeState<I>) -> usize {
        block_size
            .saturating_sub(NODE_COMMON_HEADER_SIZE + state.kind.header_size())
            .saturating_sub(state.content_size)
    }

    /// Percentage of the interval section in use.
    pub fn usage_percent(&self) -> u8 {
        let state = self.state.read();
        let capacity = self
            .block_size
            .saturating_sub(NODE_COMMON_HEADER_SIZE + state.kind.header_size());
        if capacity == 0 {
            return 100;
        }
        ((state.content_size * 100) / capacity).min(100) as u8
    }

    /// Adds an interval, keeping the `(end, start)` order.
    ///
    /// `size` is the interval's encoded size; the caller must have checked
    /// it against [`HtNode::free_space`]. Adding to a closed node or past
    /// the free space is rejected.
    pub fn add(&self, interval: I, size: usize) -> HistoryTreeResult<()> {
        let mut state = self.state.write();
        if state.closed {
            return Err(HistoryTreeError::invariant(format!(
                "add to closed node {}",
                self.seq
            )));
        }
        let free = Self::free_space_of(self.block_size, &state);
        if size > free {
            return Err(HistoryTreeError::NodeOverflow {
                seq: self.seq,
                needed: size,
                free,
            });
        }

        let key = (interval.end(), interval.start());
        let idx = state
            .intervals
            .partition_point(|i| (i.end(), i.start()) <= key);
        state.intervals.insert(idx, interval);
        state.content_size += size;
        Ok(())
    }

    /// Fixes the end time of this node.
    ///
    /// Fails if an interval ends after `end` or if `end` precedes the node's
    /// start: either means the tree model is corrupted.
    pub fn close(&self, end: i64) -> HistoryTreeResult<()> {
        let mut state = self.state.write();
        if end < self.start {
            return Err(HistoryTreeError::invariant(format!(
                "closing node {} at {end}, before its start {}",
                self.seq, self.start
            )));
        }
        // Intervals are sorted by end, so the last one ends latest
        if let Some(last) = state.intervals.last() {
            if last.end() > end {
                return Err(HistoryTreeError::invariant(format!(
                    "closing node {} at {end}, but an interval ends at {}",
                    self.seq,
                    last.end()
                )));
            }
        }
        state.end = end;
        state.closed = true;
        Ok(())
    }

    // =========================================================================
    // Core Operations
    // =========================================================================

    /// Links a new child. Fails on leaf nodes and full core nodes.
    pub fn link_new_child(&self, child: SeqNum) -> HistoryTreeResult<()> {
        let mut state = self.state.write();
        match &mut state.kind {
            NodeKind::Core(core) => core.link(self.seq, child),
            NodeKind::Leaf => Err(HistoryTreeError::invariant(format!(
                "cannot link a child to leaf node {}",
                self.seq
            ))),
        }
    }

    /// Number of children (0 for leaves).
    pub fn nb_children(&self) -> usize {
        match &self.state.read().kind {
            NodeKind::Core(core) => core.nb_children(),
            NodeKind::Leaf => 0,
        }
    }

    /// Returns true if this core node cannot take another child.
    ///
    /// Leaves are always full.
    pub fn is_full_of_children(&self) -> bool {
        match &self.state.read().kind {
            NodeKind::Core(core) => core.is_full(),
            NodeKind::Leaf => true,
        }
    }

    /// Most recently linked child.
    pub fn latest_child(&self) -> Option<SeqNum> {
        match &self.state.read().kind {
            NodeKind::Core(core) => core.latest_child(),
            NodeKind::Leaf => None,
        }
    }

    /// All children, oldest first.
    pub fn children(&self) -> Vec<SeqNum> {
        match &self.state.read().kind {
            NodeKind::Core(core) => core.children().to_vec(),
            NodeKind::Leaf => Vec::new(),
        }
    }

    /// Children a query restricted to `condition` must visit.
    pub fn select_next_children(&self, condition: &TimeRangeCondition) -> Vec<SeqNum> {
        match &self.state.read().kind {
            NodeKind::Core(core) => core.select_next_children(condition),
            NodeKind::Leaf => Vec::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Index of the first interval that can intersect `condition`.
    fn start_index(intervals: &[I], condition: &TimeRangeCondition) -> usize {
        let min = condition.min();
        intervals.partition_point(|i| i.end() < min)
    }

    /// Intervals of this node intersecting `condition` and accepted by
    /// `predicate`, in the node's `(end, start)` order.
    pub fn matching_intervals<F>(&self, condition: &TimeRangeCondition, predicate: F) -> Vec<I>
    where
        F: Fn(&I) -> bool,
    {
        let state = self.state.read();
        let from = Self::start_index(&state.intervals, condition);
        state.intervals[from..]
            .iter()
            .filter(|&i| condition.intersects(i.start(), i.end()) && predicate(i))
            .cloned()
            .collect()
    }

    /// First interval of this node matching `condition` and `predicate`.
    pub fn matching_interval<F>(&self, condition: &TimeRangeCondition, predicate: F) -> Option<I>
    where
        F: Fn(&I) -> bool,
    {
        let state = self.state.read();
        let from = Self::start_index(&state.intervals, condition);
        state.intervals[from..]
            .iter()
            .find(|&i| condition.intersects(i.start(), i.end()) && predicate(i))
            .cloned()
    }

    /// Snapshot of every interval in the node.
    pub fn intervals(&self) -> Vec<I> {
        self.state.read().intervals.clone()
    }

    /// Snapshot of the node's metadata.
    pub fn info(&self) -> NodeInfo {
        let state = self.state.read();
        let children = match &state.kind {
            NodeKind::Core(core) => core.children().to_vec(),
            NodeKind::Leaf => Vec::new(),
        };
        let header = NODE_COMMON_HEADER_SIZE + state.kind.header_size();
        let capacity = self.block_size.saturating_sub(header);
        NodeInfo {
            seq: self.seq,
            node_type: state.kind.node_type(),
            parent: state.parent,
            start: self.start,
            end: state.closed.then_some(state.end),
            interval_count: state.intervals.len(),
            content_size: state.content_size,
            capacity,
            on_disk: self.is_on_disk(),
            children,
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serializes this node into exactly one block.
    ///
    /// Only closed nodes can be written.
    pub fn encode<C>(&self, codec: &C) -> HistoryTreeResult<Bytes>
    where
        C: IntervalCodec<Interval = I>,
    {
        let state = self.state.read();
        if !state.closed {
            return Err(HistoryTreeError::invariant(format!(
                "node {} must be closed before it is written",
                self.seq
            )));
        }

        let mut buf = BytesMut::with_capacity(self.block_size);
        buf.put_u8(state.kind.node_type().as_byte());
        buf.put_i64_le(self.start);
        buf.put_i64_le(state.end);
        buf.put_i32_le(self.seq.as_i32());
        buf.put_i32_le(state.parent.as_i32());
        buf.put_i32_le(state.intervals.len() as i32);
        buf.put_u8(RESERVED_CLOSED);

        if let NodeKind::Core(core) = &state.kind {
            core.encode(&mut buf);
        }
        let header_size = buf.len();

        for interval in &state.intervals {
            codec.encode(interval, &mut buf);
        }

        let written = buf.len() - header_size;
        if written != state.content_size {
            return Err(HistoryTreeError::invariant(format!(
                "node {}: codec wrote {written} bytes for {} accounted",
                self.seq, state.content_size
            )));
        }
        if buf.len() > self.block_size {
            return Err(HistoryTreeError::invariant(format!(
                "node {} serialized to {} bytes, block size is {}",
                self.seq,
                buf.len(),
                self.block_size
            )));
        }

        buf.resize(self.block_size, 0);
        Ok(buf.freeze())
    }

    /// Rebuilds a node from a block written by [`HtNode::encode`].
    ///
    /// The returned node is closed and marked on disk.
    pub fn decode<C>(block: Bytes, codec: &C, config: &TreeConfig) -> HistoryTreeResult<Self>
    where
        C: IntervalCodec<Interval = I>,
    {
        if block.len() != config.block_size {
            return Err(HistoryTreeError::invariant(format!(
                "read {} bytes for a {} byte block",
                block.len(),
                config.block_size
            )));
        }

        let mut buf = block;
        let node_type = NodeType::from_byte(buf.get_u8())?;
        let start = buf.get_i64_le();
        let end = buf.get_i64_le();
        let seq = SeqNum::new(buf.get_i32_le());
        let parent = SeqNum::new(buf.get_i32_le());
        let count = buf.get_i32_le();
        let _reserved = buf.get_u8();

        let count = usize::try_from(count).map_err(|_| {
            HistoryTreeError::deserialization(format!("node {seq}: negative interval count"))
        })?;

        let kind = match node_type {
            NodeType::Leaf => NodeKind::Leaf,
            NodeType::Core => NodeKind::Core(CoreData::decode(&mut buf, config.max_children)?),
        };

        let node = Self::with_kind(seq, parent, start, config.block_size, kind);
        for _ in 0..count {
            let interval = codec.decode(&mut buf)?;
            let size = codec.encoded_size(&interval);
            node.add(interval, size)?;
        }
        node.close(end)?;
        node.mark_on_disk();
        Ok(node)
    }
}

impl<I: HtInterval> fmt::Display for HtNode<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info())
    }
}

impl<I: HtInterval> fmt::Debug for HtNode<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info();
        f.debug_struct("HtNode")
            .field("seq", &info.seq)
            .field("type", &info.node_type)
            .field("parent", &info.parent)
            .field("start", &info.start)
            .field("end", &info.end)
            .field("intervals", &info.interval_count)
            .field("on_disk", &info.on_disk)
            .finish()
    }
}

// =============================================================================
// Node Info
// =============================================================================

/// Metadata of one node, detached from its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    /// Sequence number.
    pub seq: SeqNum,
    /// Node type.
    pub node_type: NodeType,
    /// Parent sequence number.
    pub parent: SeqNum,
    /// Start time.
    pub start: i64,
    /// End time, `None` while open.
    pub end: Option<i64>,
    /// Number of intervals.
    pub interval_count: usize,
    /// Bytes used by intervals.
    pub content_size: usize,
    /// Bytes available for intervals in an empty node.
    pub capacity: usize,
    /// Whether the node was written to the file.
    pub on_disk: bool,
    /// Children, oldest first.
    pub children: Vec<SeqNum>,
}

impl NodeInfo {
    /// Percentage of the interval section in use.
    pub fn usage_percent(&self) -> u8 {
        if self.capacity == 0 {
            return 100;
        }
        ((self.content_size * 100) / self.capacity).min(100) as u8
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {}, ", self.seq)?;
        if self.parent.is_valid() {
            write!(f, "Parent {}, ", self.parent)?;
        } else {
            write!(f, "Root, ")?;
        }
        write!(
            f,
            "{} intervals ({}% used), [{} - ",
            self.interval_count,
            self.usage_percent(),
            self.start
        )?;
        match self.end {
            Some(end) => write!(f, "{end}]"),
            None => write!(f, "...]"),
        }
    }
}
