//! How a history file is opened.

use std::fs;

/// Open mode for a history file.
///
/// A history file is either started over for a fresh tree or opened
/// read-only to serve queries on a sealed one, so the options come as
/// presets rather than a flag-by-flag builder.
///
/// # Example
///
/// ```rust
/// use htree_storage::file::OpenOptions;
///
/// assert!(OpenOptions::for_truncate().is_write());
/// assert!(!OpenOptions::for_read().is_write());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    write: bool,
}

impl OpenOptions {
    /// Opens an existing file for queries.
    #[must_use]
    pub const fn for_read() -> Self {
        Self { write: false }
    }

    /// Starts a file over from zero bytes, creating it if missing.
    #[must_use]
    pub const fn for_truncate() -> Self {
        Self { write: true }
    }

    /// Whether the handle may write.
    #[inline]
    pub fn is_write(&self) -> bool {
        self.write
    }

    pub(crate) fn to_std_options(self) -> fs::OpenOptions {
        let mut opts = fs::OpenOptions::new();
        opts.read(true)
            .write(self.write)
            .create(self.write)
            .truncate(self.write);
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(!OpenOptions::for_read().is_write());
        assert!(OpenOptions::for_truncate().is_write());
        assert_ne!(OpenOptions::for_read(), OpenOptions::for_truncate());
    }

    #[test]
    fn test_read_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ht");
        assert!(OpenOptions::for_read().to_std_options().open(&path).is_err());
        assert!(!path.exists());

        OpenOptions::for_truncate().to_std_options().open(&path).unwrap();
        assert!(path.exists());
    }
}
