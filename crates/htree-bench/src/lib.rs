//! History tree performance benchmarks
//!
//! This crate contains benchmarks for:
//! - Interval insertion with different block sizes and fan-outs
//! - Range and point queries against sealed and open trees
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p htree-bench
//! ```

pub mod utils;
