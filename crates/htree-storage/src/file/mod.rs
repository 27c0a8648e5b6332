//! Block file layer under the history tree.
//!
//! A history file is a 4 KiB header followed by equally sized node blocks.
//! The tree only ever needs to move whole blocks at known offsets, so this
//! layer offers exactly that: positioned reads and writes on a shared
//! handle, with short transfers reported as errors.
//!
//! ```text
//!   HistoryTree ── TreeIo ── StandardFile (FileHandle over Mutex<File>)
//! ```
//!
//! ```rust,no_run
//! use htree_storage::file::{FileHandle, OpenOptions, StandardFile};
//!
//! fn write_first_block(path: &str) -> std::io::Result<()> {
//!     let file = StandardFile::open(path, OpenOptions::for_truncate())?;
//!     file.write_all_at(&[0u8; 4096], 4096)?;
//!     file.sync()?;
//!     Ok(())
//! }
//! ```

mod error;
mod handle;
mod options;
mod std_io;

pub use error::{IoError, IoResult};
pub use handle::FileHandle;
pub use options::OpenOptions;
pub use std_io::StandardFile;
