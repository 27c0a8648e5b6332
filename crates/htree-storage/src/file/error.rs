//! Errors raised by the block file layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result of a block file operation.
pub type IoResult<T> = Result<T, IoError>;

/// Failure of a block file operation.
///
/// Opening failures keep the path that was opened; transfer failures keep the
/// offset, since one history file holds many blocks.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum IoError {
    /// Any other operating system error.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// The history file does not exist.
    #[error("history file not found: {path}")]
    NotFound { path: PathBuf },

    /// The history file exists but may not be opened in the requested mode.
    #[error("permission denied on history file: {path}")]
    PermissionDenied { path: PathBuf },

    /// The file ended before a whole block was transferred.
    #[error("short {operation} at offset {offset}: wanted {expected} bytes, moved {actual}")]
    ShortIo {
        operation: &'static str,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// A mutating call on a handle opened for reading.
    #[error("{operation} on a history file opened read-only")]
    ReadOnly { operation: &'static str },
}

impl IoError {
    /// Missing file at `path`.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Read that hit end of file after `actual` of `expected` bytes.
    pub fn short_read(offset: u64, expected: usize, actual: usize) -> Self {
        Self::ShortIo {
            operation: "read",
            offset,
            expected,
            actual,
        }
    }

    /// Write that stalled after `actual` of `expected` bytes.
    pub fn short_write(offset: u64, expected: usize, actual: usize) -> Self {
        Self::ShortIo {
            operation: "write",
            offset,
            expected,
            actual,
        }
    }

    /// `operation` attempted through a read-only handle.
    pub fn read_only(operation: &'static str) -> Self {
        Self::ReadOnly { operation }
    }

    /// True when the file is missing, whether or not the path was captured.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Attaches `path` to the errors where it tells the caller which file to fix.
    pub fn from_io_with_path(err: io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.into() },
            _ => Self::Io { source: err },
        }
    }
}

impl From<IoError> for io::Error {
    fn from(err: IoError) -> Self {
        let kind = match err {
            IoError::Io { source } => return source,
            IoError::NotFound { .. } => io::ErrorKind::NotFound,
            IoError::PermissionDenied { .. } | IoError::ReadOnly { .. } => {
                io::ErrorKind::PermissionDenied
            }
            IoError::ShortIo { .. } => io::ErrorKind::UnexpectedEof,
        };
        io::Error::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_with_and_without_path() {
        assert!(IoError::not_found("/tmp/gone.ht").is_not_found());

        let bare: IoError = io::Error::from(io::ErrorKind::NotFound).into();
        assert!(matches!(bare, IoError::Io { .. }));
        assert!(bare.is_not_found());
    }

    #[test]
    fn test_path_is_kept() {
        let err = IoError::from_io_with_path(
            io::Error::from(io::ErrorKind::PermissionDenied),
            "/tmp/locked.ht",
        );
        assert!(matches!(err, IoError::PermissionDenied { .. }));
        assert!(err.to_string().contains("/tmp/locked.ht"));

        let other = IoError::from_io_with_path(io::Error::from(io::ErrorKind::Interrupted), "/x");
        assert!(matches!(other, IoError::Io { .. }));
    }

    #[test]
    fn test_short_block() {
        let err = IoError::short_read(4096, 4096, 100);
        assert_eq!(
            err.to_string(),
            "short read at offset 4096: wanted 4096 bytes, moved 100"
        );

        let std_err: io::Error = IoError::short_write(0, 4096, 0).into();
        assert_eq!(std_err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_only_maps_to_permission() {
        let err = IoError::read_only("write");
        assert!(err.to_string().starts_with("write on"));

        let std_err: io::Error = err.into();
        assert_eq!(std_err.kind(), io::ErrorKind::PermissionDenied);
    }
}
