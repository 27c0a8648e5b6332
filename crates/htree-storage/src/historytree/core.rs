//! Child directory of core nodes.
//!
//! A core node records its children by sequence number, in the order they
//! were linked. On disk the directory is a count followed by `max_children`
//! slots, so every core node of a tree has the same header size.
//!
//! ```text
//! ┌──────────────┬─────────┬─────────┬─────────┬─────┬─────────┐
//! │ count (i32)  │ child 0 │ child 1 │   0     │ ... │   0     │
//! └──────────────┴─────────┴─────────┴─────────┴─────┴─────────┘
//!                 └──────────── max_children slots ───────────┘
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use htree_common::types::{SeqNum, TimeRangeCondition};

use super::error::{HistoryTreeError, HistoryTreeResult};

/// Children of a core node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreData {
    max_children: usize,
    children: Vec<SeqNum>,
}

impl CoreData {
    /// Creates an empty directory with room for `max_children` children.
    pub fn new(max_children: usize) -> Self {
        Self {
            max_children,
            children: Vec::with_capacity(max_children),
        }
    }

    /// Size of the directory on disk.
    pub fn header_size(&self) -> usize {
        4 + 4 * self.max_children
    }

    /// Maximum number of children.
    pub fn max_children(&self) -> usize {
        self.max_children
    }

    /// Number of linked children.
    pub fn nb_children(&self) -> usize {
        self.children.len()
    }

    /// Returns true if no more children can be linked.
    pub fn is_full(&self) -> bool {
        self.children.len() >= self.max_children
    }

    /// Linked children, oldest first.
    pub fn children(&self) -> &[SeqNum] {
        &self.children
    }

    /// The `index`-th linked child.
    pub fn child(&self, index: usize) -> Option<SeqNum> {
        self.children.get(index).copied()
    }

    /// The most recently linked child.
    pub fn latest_child(&self) -> Option<SeqNum> {
        self.children.last().copied()
    }

    /// Appends a child. `owner` is only used to report errors.
    pub fn link(&mut self, owner: SeqNum, child: SeqNum) -> HistoryTreeResult<()> {
        if self.is_full() {
            return Err(HistoryTreeError::ChildLimitReached {
                seq: owner,
                max: self.max_children,
            });
        }
        self.children.push(child);
        Ok(())
    }

    /// Children a query restricted to `condition` has to visit.
    ///
    /// Child ranges are not recorded here, so every child is returned.
    pub fn select_next_children(&self, _condition: &TimeRangeCondition) -> Vec<SeqNum> {
        self.children.clone()
    }

    /// Appends the on-disk form of the directory to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.children.len() as i32);
        for child in &self.children {
            buf.put_i32_le(child.as_i32());
        }
        for _ in self.children.len()..self.max_children {
            buf.put_i32_le(0);
        }
    }

    /// Reads a directory written by [`CoreData::encode`].
    pub fn decode(buf: &mut Bytes, max_children: usize) -> HistoryTreeResult<Self> {
        let needed = 4 + 4 * max_children;
        if buf.remaining() < needed {
            return Err(HistoryTreeError::deserialization(format!(
                "child directory needs {needed} bytes, {} left",
                buf.remaining()
            )));
        }

        let count = buf.get_i32_le();
        let count = usize::try_from(count)
            .ok()
            .filter(|&c| c <= max_children)
            .ok_or_else(|| {
                HistoryTreeError::deserialization(format!(
                    "child count {count} outside [0, {max_children}]"
                ))
            })?;

        let mut data = Self::new(max_children);
        for slot in 0..max_children {
            let child = buf.get_i32_le();
            if slot < count {
                data.children.push(SeqNum::new(child));
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_until_full() {
        let owner = SeqNum::new(1);
        let mut core = CoreData::new(2);
        assert_eq!(core.latest_child(), None);

        core.link(owner, SeqNum::new(0)).unwrap();
        core.link(owner, SeqNum::new(2)).unwrap();
        assert!(core.is_full());
        assert_eq!(core.latest_child(), Some(SeqNum::new(2)));
        assert_eq!(core.child(0), Some(SeqNum::new(0)));

        let err = core.link(owner, SeqNum::new(3)).unwrap_err();
        assert!(matches!(
            err,
            HistoryTreeError::ChildLimitReached { max: 2, .. }
        ));
        assert_eq!(core.nb_children(), 2);
    }

    #[test]
    fn test_encode_pads_unused_slots() {
        let mut core = CoreData::new(4);
        core.link(SeqNum::new(9), SeqNum::new(5)).unwrap();

        let mut buf = BytesMut::new();
        core.encode(&mut buf);
        assert_eq!(buf.len(), core.header_size());
        assert_eq!(&buf[..8], &[1, 0, 0, 0, 5, 0, 0, 0]);
        assert!(buf[8..].iter().all(|&b| b == 0));

        let mut bytes = buf.freeze();
        let decoded = CoreData::decode(&mut bytes, 4).unwrap();
        assert_eq!(decoded, core);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_count() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(3);
        buf.put_bytes(0, 8);
        assert!(CoreData::decode(&mut buf.freeze(), 2).is_err());

        let mut buf = BytesMut::new();
        buf.put_i32_le(-1);
        buf.put_bytes(0, 8);
        assert!(CoreData::decode(&mut buf.freeze(), 2).is_err());
    }

    #[test]
    fn test_select_next_children_returns_all() {
        let mut core = CoreData::new(3);
        core.link(SeqNum::new(4), SeqNum::new(1)).unwrap();
        core.link(SeqNum::new(4), SeqNum::new(3)).unwrap();
        let selected = core.select_next_children(&TimeRangeCondition::singleton(0));
        assert_eq!(selected, vec![SeqNum::new(1), SeqNum::new(3)]);
    }
}
