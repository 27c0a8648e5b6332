//! History tree: a disk-backed tree of time intervals.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          HistoryTree                            │
//! │  insert / close_tree / get_matching_intervals / check_integrity │
//! └────────────┬──────────────────────────────────┬─────────────────┘
//!              │                                  │
//!    ┌─────────┴─────────┐              ┌─────────┴─────────┐
//!    │   LatestBranch    │              │      TreeIo       │
//!    │ open nodes, root  │              │ header + blocks,  │
//!    │ down to the leaf  │              │ NodeCache (LRU)   │
//!    └─────────┬─────────┘              └─────────┬─────────┘
//!              │                                  │
//!    ┌─────────┴─────────┐              ┌─────────┴─────────┐
//!    │ HtNode (leaf/core)│              │   StandardFile    │
//!    │ sorted intervals  │              │ positioned I/O    │
//!    └───────────────────┘              └───────────────────┘
//! ```
//!
//! ## File layout
//!
//! ```text
//! ┌──────────────┬───────────┬───────────┬───────────┬─────
//! │ header 4 KB  │ node #0   │ node #1   │ node #2   │ ...
//! └──────────────┴───────────┴───────────┴───────────┴─────
//!                 ◀─ block ─▶
//! ```
//!
//! Node `n` lives at `4096 + n * block_size`. The header is only written
//! when the tree is closed, so a file without a valid header is an
//! unfinished tree.

mod branch;
mod cache;
mod config;
mod core;
mod error;
mod header;
mod interval;
mod io;
mod node;
mod query;
mod tree;

pub use cache::CacheStats;
pub use config::TreeConfig;
pub use self::core::CoreData;
pub use error::{HistoryTreeError, HistoryTreeResult};
pub use header::TreeHeader;
pub use interval::{BasicCodec, BasicInterval, HtInterval, IntervalCodec};
pub use node::{HtNode, NodeInfo, NodeKind, NodeType};
pub use query::MatchingIntervals;
pub use tree::{HistoryTree, TreeStats};
