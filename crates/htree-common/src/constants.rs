//! System-wide constants for the history tree.

// =============================================================================
// File Layout
// =============================================================================

/// Size of the fixed header block at the start of every history file.
///
/// Node blocks start right after it, at `TREE_HEADER_SIZE + seq * block_size`.
pub const TREE_HEADER_SIZE: usize = 4096;

/// Magic number identifying a history file.
pub const HISTORY_FILE_MAGIC: i32 = 0x05FF_A900;

/// Current on-disk format version.
pub const HISTORY_FILE_VERSION: i32 = 3;

/// Provider version that disables the provider check when opening a file.
pub const IGNORE_PROVIDER_VERSION: i32 = -42;

// =============================================================================
// Node Geometry
// =============================================================================

/// Default node block size in bytes (64 KB).
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Default maximum number of children of a core node.
pub const DEFAULT_MAX_CHILDREN: usize = 50;

/// Default number of sealed nodes kept in the node cache.
pub const DEFAULT_NODE_CACHE_CAPACITY: usize = 256;

/// Size of the header common to every node.
///
/// type (1) + start (8) + end (8) + seq (4) + parent (4) + count (4) +
/// reserved (1) = 30 bytes.
pub const NODE_COMMON_HEADER_SIZE: usize = 30;
