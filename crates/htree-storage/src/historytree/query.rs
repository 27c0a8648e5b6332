//! Range queries over a history tree.
//!
//! A query walks the tree breadth-first from the root. Each visited node
//! narrows the condition to its own time range; nodes whose range misses
//! the condition are skipped along with their whole subtree.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::vec;

use htree_common::types::{SeqNum, TimeRangeCondition};

use super::error::HistoryTreeResult;
use super::interval::IntervalCodec;
use super::node::HtNode;
use super::tree::HistoryTree;

/// Lazy iterator over the intervals matching a query.
///
/// Nodes are read one at a time as the iterator advances. Results are
/// grouped by node and carry no global ordering. The iterator stops after
/// yielding the first error.
pub struct MatchingIntervals<'a, C: IntervalCodec, F> {
    tree: &'a HistoryTree<C>,
    condition: TimeRangeCondition,
    predicate: F,
    queue: VecDeque<SeqNum>,
    pending: vec::IntoIter<C::Interval>,
    done: bool,
}

impl<'a, C, F> MatchingIntervals<'a, C, F>
where
    C: IntervalCodec,
    F: Fn(&C::Interval) -> bool,
{
    fn new(tree: &'a HistoryTree<C>, condition: TimeRangeCondition, predicate: F) -> Self {
        Self {
            queue: VecDeque::from([tree.root_seq()]),
            pending: Vec::new().into_iter(),
            done: false,
            tree,
            condition,
            predicate,
        }
    }
}

impl<'a, C, F> Iterator for MatchingIntervals<'a, C, F>
where
    C: IntervalCodec,
    F: Fn(&C::Interval) -> bool,
{
    type Item = HistoryTreeResult<C::Interval>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(interval) = self.pending.next() {
                return Some(Ok(interval));
            }
            if self.done {
                return None;
            }
            let seq = self.queue.pop_front()?;

            match visit(self.tree, seq, &self.condition, &mut self.queue) {
                Ok(Some((node, sub))) => {
                    self.pending = node.matching_intervals(&sub, &self.predicate).into_iter();
                }
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<C: IntervalCodec, F> fmt::Debug for MatchingIntervals<'_, C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingIntervals")
            .field("condition", &self.condition)
            .field("queued_nodes", &self.queue.len())
            .field("done", &self.done)
            .finish()
    }
}

/// Reads one node, queues the children worth visiting, and returns the node
/// with the condition narrowed to its range. `None` means the node misses
/// the condition entirely.
#[allow(clippy::type_complexity)]
fn visit<C: IntervalCodec>(
    tree: &HistoryTree<C>,
    seq: SeqNum,
    condition: &TimeRangeCondition,
    queue: &mut VecDeque<SeqNum>,
) -> HistoryTreeResult<Option<(Arc<HtNode<C::Interval>>, TimeRangeCondition)>> {
    let node = tree.read_node(seq)?;
    let Some(sub) = condition.sub_condition(node.start(), node.node_end()) else {
        return Ok(None);
    };
    queue.extend(node.select_next_children(&sub));
    Ok(Some((node, sub)))
}

impl<C: IntervalCodec> HistoryTree<C> {
    /// Returns every interval intersecting `condition` and accepted by
    /// `predicate`.
    ///
    /// Intersection is inclusive at both ends. The tree may keep receiving
    /// inserts while the iterator is alive.
    pub fn get_matching_intervals<F>(
        &self,
        condition: TimeRangeCondition,
        predicate: F,
    ) -> MatchingIntervals<'_, C, F>
    where
        F: Fn(&C::Interval) -> bool,
    {
        MatchingIntervals::new(self, condition, predicate)
    }

    /// Returns any one interval intersecting `condition` and accepted by
    /// `predicate`, stopping at the first node that has one.
    pub fn get_matching_interval<F>(
        &self,
        condition: TimeRangeCondition,
        predicate: F,
    ) -> HistoryTreeResult<Option<C::Interval>>
    where
        F: Fn(&C::Interval) -> bool,
    {
        let mut queue = VecDeque::from([self.root_seq()]);
        while let Some(seq) = queue.pop_front() {
            if let Some((node, sub)) = visit(self, seq, &condition, &mut queue)? {
                if let Some(found) = node.matching_interval(&sub, &predicate) {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    /// Collects every interval intersecting `condition`.
    pub fn query(&self, condition: TimeRangeCondition) -> HistoryTreeResult<Vec<C::Interval>> {
        self.get_matching_intervals(condition, |_| true).collect()
    }
}
