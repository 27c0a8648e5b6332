//! # htree-storage
//!
//! History tree storage engine.
//!
//! This crate implements a disk-backed tree of time intervals:
//! - Fixed-size node blocks addressed by sequence number
//! - Append-mostly insertion with branch splitting and root growth
//! - Breadth-first range queries that page sealed nodes in on demand
//! - Concurrent queries while a single writer inserts

#![warn(missing_docs)]
#![warn(clippy::all)]

/// File management and I/O
pub mod file;

/// History tree implementation
pub mod historytree;

pub use historytree::{
    BasicCodec, BasicInterval, HistoryTree, HistoryTreeError, HistoryTreeResult, HtInterval,
    IntervalCodec, TreeConfig,
};
