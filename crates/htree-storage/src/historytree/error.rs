//! Error types for the history tree.
//!
//! This module defines all error types that can occur during history tree
//! operations.

use std::path::PathBuf;

use htree_common::types::SeqNum;
use thiserror::Error;

use crate::file::IoError;

/// Result type for history tree operations.
pub type HistoryTreeResult<T> = Result<T, HistoryTreeError>;

/// Errors that can occur in history tree operations.
#[derive(Debug, Error)]
pub enum HistoryTreeError {
    /// The tree configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The file is not a readable history file.
    #[error("invalid history file {path}: {reason}")]
    InvalidFile {
        /// Path of the rejected file.
        path: PathBuf,
        /// Why the file was rejected.
        reason: String,
    },

    /// The file was built by an incompatible provider and must be rebuilt.
    #[error("provider version mismatch: expected {expected}, file has {found}")]
    ProviderVersionMismatch {
        /// Version the caller expects.
        expected: i32,
        /// Version recorded in the file.
        found: i32,
    },

    /// An interval starts before the tree does.
    #[error("interval start {start} is before tree start {tree_start}")]
    IntervalBeforeTreeStart {
        /// Start of the rejected interval.
        start: i64,
        /// Start of the tree.
        tree_start: i64,
    },

    /// An interval ends before it starts.
    #[error("invalid interval: end {end} is before start {start}")]
    InvalidInterval {
        /// Start of the rejected interval.
        start: i64,
        /// End of the rejected interval.
        end: i64,
    },

    /// The tree was asked to close before the end of its data.
    #[error("cannot close tree at {requested}: data extends to {tree_end}")]
    CloseBeforeEnd {
        /// Requested end time.
        requested: i64,
        /// Current end of the tree.
        tree_end: i64,
    },

    /// An interval cannot fit even in an empty node.
    #[error("interval too large: {size} bytes (max: {max})")]
    IntervalTooLarge {
        /// Serialized size of the interval.
        size: usize,
        /// Largest size any node can hold.
        max: usize,
    },

    /// A node was asked to hold more than its block can.
    #[error("node overflow: node {seq} needs {needed} bytes, has {free}")]
    NodeOverflow {
        /// The full node.
        seq: SeqNum,
        /// Bytes the interval needs.
        needed: usize,
        /// Bytes left in the node.
        free: usize,
    },

    /// A core node already has its maximum number of children.
    #[error("node {seq} already has {max} children")]
    ChildLimitReached {
        /// The full core node.
        seq: SeqNum,
        /// Maximum number of children.
        max: usize,
    },

    /// An internal invariant was broken; the in-memory model is corrupted.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// No node with this sequence number exists.
    #[error("node not found: {0}")]
    NodeNotFound(SeqNum),

    /// The tree no longer accepts inserts.
    #[error("history tree is read-only")]
    ReadOnly,

    /// The history file was closed or deleted.
    #[error("history file is closed")]
    Closed,

    /// An interval could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl HistoryTreeError {
    /// Creates a new invalid file error.
    pub fn invalid_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a new invariant violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Creates a new deserialization error.
    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self::Deserialization(msg.into())
    }

    /// Returns true if the file should be discarded and built again.
    pub fn is_rebuild_required(&self) -> bool {
        matches!(
            self,
            Self::InvalidFile { .. } | Self::ProviderVersionMismatch { .. }
        )
    }
}

impl From<std::io::Error> for HistoryTreeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::from(err))
    }
}
