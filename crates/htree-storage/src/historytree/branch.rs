//! The latest branch: the open path from the root to the only writable leaf.

use std::sync::Arc;

use htree_common::types::SeqNum;

use super::interval::HtInterval;
use super::node::HtNode;

/// Open nodes from the root (index 0) down to the current leaf.
///
/// Never empty. Its length is the depth of the tree.
pub struct LatestBranch<I> {
    nodes: Vec<Arc<HtNode<I>>>,
}

impl<I: HtInterval> LatestBranch<I> {
    /// Creates a branch made of a single root leaf.
    pub fn new(root: Arc<HtNode<I>>) -> Self {
        Self { nodes: vec![root] }
    }

    /// Appends a node below the current leaf.
    pub fn push(&mut self, node: Arc<HtNode<I>>) {
        self.nodes.push(node);
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    /// Index of the leaf.
    pub fn leaf_depth(&self) -> usize {
        self.nodes.len() - 1
    }

    /// The root node.
    pub fn root(&self) -> &Arc<HtNode<I>> {
        &self.nodes[0]
    }

    /// The writable leaf.
    pub fn leaf(&self) -> &Arc<HtNode<I>> {
        &self.nodes[self.nodes.len() - 1]
    }

    /// The node at `depth`, 0 being the root.
    pub fn get(&self, depth: usize) -> Option<&Arc<HtNode<I>>> {
        self.nodes.get(depth)
    }

    /// Finds a node of the branch by sequence number.
    pub fn find(&self, seq: SeqNum) -> Option<Arc<HtNode<I>>> {
        self.nodes.iter().find(|n| n.seq() == seq).cloned()
    }

    /// Replaces the node at `depth`.
    pub fn replace(&mut self, depth: usize, node: Arc<HtNode<I>>) {
        self.nodes[depth] = node;
    }

    /// Nodes from the root down.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<HtNode<I>>> {
        self.nodes.iter()
    }

    /// Sequence numbers from the root down.
    pub fn seqs(&self) -> Vec<SeqNum> {
        self.nodes.iter().map(|n| n.seq()).collect()
    }
}
