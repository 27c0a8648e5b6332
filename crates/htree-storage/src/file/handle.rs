//! File handle trait.

use std::path::Path;

use super::error::{IoError, IoResult};

/// Trait for positioned, blocking file operations.
///
/// All operations take an explicit offset, so one handle can be shared by
/// several threads without any of them depending on a file cursor.
pub trait FileHandle: Send + Sync {
    /// Returns the file path.
    fn path(&self) -> &Path;

    /// Returns the current file size.
    fn size(&self) -> IoResult<u64>;

    /// Reads data from the file at the specified offset.
    ///
    /// Returns the number of bytes read. May return less than the buffer
    /// size if EOF is reached.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> IoResult<usize>;

    /// Reads exactly `buf.len()` bytes from the file at the specified offset.
    ///
    /// Returns an error if EOF is reached before the buffer is filled.
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> IoResult<()> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let n = self.read_at(&mut buf[total_read..], offset + total_read as u64)?;
            if n == 0 {
                return Err(IoError::short_read(offset, buf.len(), total_read));
            }
            total_read += n;
        }
        Ok(())
    }

    /// Writes data to the file at the specified offset.
    ///
    /// Returns the number of bytes written.
    fn write_at(&self, buf: &[u8], offset: u64) -> IoResult<usize>;

    /// Writes all bytes to the file at the specified offset.
    ///
    /// Returns an error if not all bytes could be written.
    fn write_all_at(&self, buf: &[u8], offset: u64) -> IoResult<()> {
        let mut total_written = 0;
        while total_written < buf.len() {
            let n = self.write_at(&buf[total_written..], offset + total_written as u64)?;
            if n == 0 {
                return Err(IoError::short_write(offset, buf.len(), total_written));
            }
            total_written += n;
        }
        Ok(())
    }

    /// Syncs all data and metadata to disk.
    fn sync(&self) -> IoResult<()>;
}
