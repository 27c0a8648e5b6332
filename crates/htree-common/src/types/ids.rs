//! Node identifier type.
//!
//! Sequence numbers are the only way nodes refer to each other: a core node
//! lists its children by sequence number, and a node's sequence number is
//! also its block index in the history file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node sequence number - identifies a node and its block in the file.
///
/// Sequence numbers are allocated from 0 by a strictly increasing counter
/// and are never reused. The value `-1` marks "no node", which is what the
/// root stores as its parent.
///
/// # Example
///
/// ```rust
/// use htree_common::types::SeqNum;
///
/// let seq = SeqNum::new(7);
/// assert_eq!(seq.as_i32(), 7);
/// assert_eq!(seq.next(), SeqNum::new(8));
/// assert!(!SeqNum::NONE.is_valid());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SeqNum(i32);

impl SeqNum {
    /// Sentinel for "no node" (the parent of the root).
    pub const NONE: Self = Self(-1);

    /// Sequence number of the first node of a tree.
    pub const FIRST: Self = Self(0);

    /// Creates a new `SeqNum` from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(seq: i32) -> Self {
        Self(seq)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Returns the block index of this node, if it has one.
    #[inline]
    #[must_use]
    pub const fn block_index(self) -> Option<u64> {
        if self.0 < 0 {
            None
        } else {
            Some(self.0 as u64)
        }
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this refers to an actual node.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl Default for SeqNum {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "SeqNum({})", self.0)
        } else {
            write!(f, "SeqNum(NONE)")
        }
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i32> for SeqNum {
    #[inline]
    fn from(seq: i32) -> Self {
        Self::new(seq)
    }
}

impl From<SeqNum> for i32 {
    #[inline]
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}
