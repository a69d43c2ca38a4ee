//! Temporary files
//!
//! Self-deleting scratch files in the platform temp directory.

use std::fs::File;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

/// A file in the platform temp directory, deleted when dropped
///
/// Sources and writers created from it borrow or clone its handle; the
/// file itself is removed only when this value goes away. A process that is
/// killed may leave the file behind.
#[derive(Debug)]
pub struct TemporaryFile {
    inner: NamedTempFile,
}

impl TemporaryFile {
    /// Create a new empty temporary file
    pub fn new() -> Result<Self> {
        let inner = tempfile::Builder::new().prefix("ypak-").tempfile()?;
        Ok(Self { inner })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn file(&self) -> &File {
        self.inner.as_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleted_on_drop() {
        let file = TemporaryFile::new().unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());

        drop(file);
        assert!(!path.exists());
    }
}
