//! Time conditions used by queries.
//!
//! A condition is tested against two kinds of ranges: a node's
//! `[start, end]` (to decide whether to descend into it) and an interval's
//! `[start, end]` (to decide whether it matches). Both tests are inclusive
//! on both ends.
//!
//! ```text
//! Range { low: 10, high: 20 }      ────[==========]────
//! Points([5, 12, 40])              ──●──────●─────────●──
//!                                    5     12         40
//! ```

use std::fmt;

/// Sorted, deduplicated, non-empty timestamps of a discrete condition.
///
/// Only [`TimeRangeCondition::points`] builds one, so lookups can rely on
/// the order:
///
/// ```compile_fail
/// use htree_common::types::{PointSet, TimeRangeCondition};
///
/// let unsorted = TimeRangeCondition::Points(PointSet(vec![25, 5]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointSet(Vec<i64>);

impl PointSet {
    /// The timestamps, ascending.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    fn first(&self) -> i64 {
        self.0[0]
    }

    fn last(&self) -> i64 {
        self.0[self.0.len() - 1]
    }

    /// Index of the first point at or after `t`.
    fn lower_bound(&self, t: i64) -> usize {
        self.0.partition_point(|&p| p < t)
    }
}

/// A time condition: either a continuous range or a set of discrete points.
///
/// A condition is never empty, so `min()` and `max()` are always defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeRangeCondition {
    /// Every timestamp in `[low, high]`.
    Range {
        /// Lower bound (inclusive).
        low: i64,
        /// Upper bound (inclusive).
        high: i64,
    },
    /// A set of timestamps.
    Points(PointSet),
}

impl TimeRangeCondition {
    /// Creates a continuous condition over `[a, b]`, in either order.
    #[must_use]
    pub fn range(a: i64, b: i64) -> Self {
        Self::Range {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// Creates a condition matching a single timestamp.
    #[must_use]
    pub fn singleton(t: i64) -> Self {
        Self::Range { low: t, high: t }
    }

    /// Creates a condition matching the whole time line.
    #[must_use]
    pub fn all() -> Self {
        Self::Range {
            low: i64::MIN,
            high: i64::MAX,
        }
    }

    /// Creates a discrete condition from timestamps in any order.
    ///
    /// Returns `None` if no timestamp is given.
    pub fn points(times: impl IntoIterator<Item = i64>) -> Option<Self> {
        let mut points: Vec<i64> = times.into_iter().collect();
        if points.is_empty() {
            return None;
        }
        points.sort_unstable();
        points.dedup();
        Some(Self::Points(PointSet(points)))
    }

    /// Returns the smallest timestamp matched by this condition.
    #[must_use]
    pub fn min(&self) -> i64 {
        match self {
            Self::Range { low, .. } => *low,
            Self::Points(points) => points.first(),
        }
    }

    /// Returns the largest timestamp matched by this condition.
    #[must_use]
    pub fn max(&self) -> i64 {
        match self {
            Self::Range { high, .. } => *high,
            Self::Points(points) => points.last(),
        }
    }

    /// Returns true if `t` satisfies this condition.
    #[must_use]
    pub fn contains(&self, t: i64) -> bool {
        match self {
            Self::Range { low, high } => *low <= t && t <= *high,
            Self::Points(points) => points.as_slice().binary_search(&t).is_ok(),
        }
    }

    /// Returns true if any timestamp of `[low, high]` satisfies this condition.
    #[must_use]
    pub fn intersects(&self, low: i64, high: i64) -> bool {
        if low > high {
            return false;
        }
        match self {
            Self::Range {
                low: self_low,
                high: self_high,
            } => *self_low <= high && low <= *self_high,
            Self::Points(points) => {
                let idx = points.lower_bound(low);
                points.as_slice().get(idx).is_some_and(|&p| p <= high)
            }
        }
    }

    /// Restricts this condition to `[from, to]`.
    ///
    /// Returns `None` when nothing is left, which is how queries decide to
    /// prune a node.
    #[must_use]
    pub fn sub_condition(&self, from: i64, to: i64) -> Option<Self> {
        if from > to {
            return None;
        }
        match self {
            Self::Range { low, high } => {
                let low = (*low).max(from);
                let high = (*high).min(to);
                (low <= high).then_some(Self::Range { low, high })
            }
            Self::Points(points) => {
                let first = points.lower_bound(from);
                let last = points.as_slice().partition_point(|&p| p <= to);
                (first < last)
                    .then(|| Self::Points(PointSet(points.as_slice()[first..last].to_vec())))
            }
        }
    }
}

impl fmt::Display for TimeRangeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { low, high } => write!(f, "[{low}, {high}]"),
            Self::Points(points) => {
                write!(f, "{{")?;
                for (i, p) in points.as_slice().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
