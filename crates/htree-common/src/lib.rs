//! # htree-common
//!
//! Common types and constants for the history tree.
//!
//! This crate provides the small value types shared by the storage engine,
//! the CLI and the test crates:
//!
//! - **Types**: `SeqNum` (node sequence number) and `TimeRangeCondition`
//!   (the time condition that queries test against node and interval ranges)
//! - **Constants**: on-disk header size, default geometry, magic number and
//!   file format version
//!
//! ## Example
//!
//! ```rust
//! use htree_common::{SeqNum, TimeRangeCondition};
//!
//! let root = SeqNum::new(0);
//! assert!(root.is_valid());
//!
//! let cond = TimeRangeCondition::range(10, 20);
//! assert!(cond.intersects(15, 30));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::{SeqNum, TimeRangeCondition};
