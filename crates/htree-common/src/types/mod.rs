//! Core types for the history tree.

mod ids;
mod range;

pub use ids::SeqNum;
pub use range::{PointSet, TimeRangeCondition};
