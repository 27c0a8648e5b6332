//! LRU cache of sealed nodes.
//!
//! Sealed nodes never change, so the cache hands out shared `Arc`s and never
//! needs invalidation, except when the whole file goes away.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use htree_common::types::SeqNum;
use parking_lot::Mutex;

use super::interval::HtInterval;
use super::node::HtNode;

/// Statistics for cache operations.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    /// Number of lookups served from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that had to go to disk.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of nodes dropped to make room.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

struct CacheState<I> {
    /// Node and the tick of its last use.
    entries: HashMap<SeqNum, (Arc<HtNode<I>>, u64)>,
    /// Last-use tick to node, oldest first.
    recency: BTreeMap<u64, SeqNum>,
    tick: u64,
}

/// A thread-safe LRU cache of nodes keyed by sequence number.
///
/// A capacity of 0 disables caching.
pub struct NodeCache<I> {
    capacity: usize,
    state: Mutex<CacheState<I>>,
    stats: CacheStats,
}

impl<I: HtInterval> NodeCache<I> {
    /// Creates a cache holding at most `capacity` nodes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState {
                entries: HashMap::with_capacity(capacity),
                recency: BTreeMap::new(),
                tick: 0,
            }),
            stats: CacheStats::default(),
        }
    }

    /// Number of cached nodes.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Looks up a node and marks it as recently used.
    pub fn get(&self, seq: SeqNum) -> Option<Arc<HtNode<I>>> {
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;

        let CacheState {
            entries, recency, ..
        } = &mut *state;
        match entries.get_mut(&seq) {
            Some((node, last_used)) => {
                recency.remove(&*last_used);
                recency.insert(tick, seq);
                *last_used = tick;
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(node))
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts a node, evicting the least recently used one if full.
    pub fn insert(&self, node: Arc<HtNode<I>>) {
        if self.capacity == 0 {
            return;
        }
        let seq = node.seq();
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;

        if let Some((_, last_used)) = state.entries.remove(&seq) {
            state.recency.remove(&last_used);
        } else if state.entries.len() >= self.capacity {
            if let Some((_, victim)) = state.recency.pop_first() {
                state.entries.remove(&victim);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        state.entries.insert(seq, (node, tick));
        state.recency.insert(tick, seq);
    }

    /// Drops every cached node.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.recency.clear();
    }
}
