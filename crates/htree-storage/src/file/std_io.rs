//! Standard blocking file implementation.
//!
//! Reads and writes seek and transfer under one mutex, so concurrent callers
//! never interleave a seek with another caller's transfer.

use std::fs::File as StdFile;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::error::{IoError, IoResult};
use super::handle::FileHandle;
use super::options::OpenOptions;

/// Standard file implementation over `std::fs::File`.
pub struct StandardFile {
    /// The underlying file, wrapped in a mutex for thread-safe access.
    file: Mutex<StdFile>,
    /// The file path.
    path: PathBuf,
    /// Whether the file was opened with write access.
    writable: bool,
}

impl StandardFile {
    /// Opens a file with the specified options.
    pub fn open(path: impl AsRef<Path>, options: OpenOptions) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = options
            .to_std_options()
            .open(&path)
            .map_err(|e| IoError::from_io_with_path(e, &path))?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            writable: options.is_write(),
        })
    }
}

impl FileHandle for StandardFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> IoResult<u64> {
        let file = self.file.lock();
        file.metadata()
            .map(|m| m.len())
            .map_err(|e| IoError::Io { source: e })
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> IoResult<usize> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| IoError::Io { source: e })?;
        file.read(buf).map_err(|e| IoError::Io { source: e })
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> IoResult<usize> {
        if !self.writable {
            return Err(IoError::read_only("write"));
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| IoError::Io { source: e })?;
        file.write(buf).map_err(|e| IoError::Io { source: e })
    }

    fn sync(&self) -> IoResult<()> {
        if !self.writable {
            return Ok(());
        }
        let file = self.file.lock();
        file.sync_all().map_err(|e| IoError::Io { source: e })
    }
}

impl std::fmt::Debug for StandardFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardFile")
            .field("path", &self.path)
            .field("writable", &self.writable)
            .finish()
    }
}
