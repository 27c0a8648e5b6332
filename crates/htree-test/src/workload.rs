//! Interval streams for tests and benchmarks.
//!
//! Every generator yields intervals with non-decreasing start times, which
//! is the order a trace analysis produces them in.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use htree_storage::BasicInterval;

/// Shape of a generated workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadSpec {
    /// Number of intervals.
    pub count: usize,
    /// Largest gap between consecutive start times.
    pub max_gap: i64,
    /// Largest interval duration.
    pub max_duration: i64,
    /// Number of distinct attributes.
    pub attributes: i32,
    /// Largest value payload in bytes.
    pub max_value_len: usize,
    /// Earliest start time.
    pub start: i64,
}

impl Default for WorkloadSpec {
    fn default() -> Self {
        Self {
            count: 1000,
            max_gap: 10,
            max_duration: 50,
            attributes: 8,
            max_value_len: 16,
            start: 0,
        }
    }
}

impl WorkloadSpec {
    /// Sets the number of intervals.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Sets the largest interval duration.
    pub fn with_max_duration(mut self, max_duration: i64) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Sets the earliest start time.
    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Generates the intervals from `seed`.
    pub fn generate(&self, seed: u64) -> Vec<BasicInterval> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut time = self.start;
        (0..self.count)
            .map(|_| {
                time += rng.gen_range(0..=self.max_gap);
                let end = time + rng.gen_range(0..=self.max_duration);
                let attribute = rng.gen_range(0..self.attributes.max(1));
                let value: Vec<u8> = (0..rng.gen_range(0..=self.max_value_len))
                    .map(|_| rng.gen())
                    .collect();
                BasicInterval::new(time, end, attribute, value)
            })
            .collect()
    }
}

/// Back-to-back intervals `[10k, 10k + 10]` that all encode to `size` bytes.
///
/// Each interval starts where the previous one ends, so every one of them
/// lands in the latest leaf.
pub fn contiguous(count: usize, size: usize) -> Vec<BasicInterval> {
    (0..count as i64)
        .map(|k| BasicInterval::with_encoded_size(10 * k, 10 * k + 10, k as i32, size))
        .collect()
}

/// Intervals that all end at the same time, forcing them up the branch once
/// the leaf fills.
pub fn nested(count: usize, end: i64) -> Vec<BasicInterval> {
    (0..count as i64)
        .map(|k| BasicInterval::new(k, end.max(k), k as i32, Vec::<u8>::new()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_deterministic() {
        let spec = WorkloadSpec::default().with_count(100);
        assert_eq!(spec.generate(7), spec.generate(7));
        assert_ne!(spec.generate(7), spec.generate(8));
    }

    #[test]
    fn test_generate_starts_are_sorted() {
        let spec = WorkloadSpec::default().with_count(500).with_start(1000);
        let intervals = spec.generate(1);
        assert_eq!(intervals.len(), 500);
        assert!(intervals[0].start >= 1000);
        assert!(intervals.windows(2).all(|w| w[0].start <= w[1].start));
        assert!(intervals.iter().all(|i| i.end >= i.start));
    }

    #[test]
    fn test_contiguous() {
        let intervals = contiguous(3, 64);
        assert_eq!(intervals[1].start, 10);
        assert_eq!(intervals[1].end, 20);
        assert_eq!(intervals[2].value.len(), 64 - BasicInterval::FIXED_SIZE);
    }
}
