//! # htree-test
//!
//! Integration tests for the history tree.
//!
//! This crate contains:
//! - Workload generators producing interval streams
//! - Helpers for building trees in temporary directories
//! - Reference answers computed by brute force

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;

/// Workload generators
pub mod workload;
