//! Sources
//!
//! Immutable, shareable, randomly readable views of bytes.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, YpakError};
use crate::memory::ByteArena;

use super::platform;
use super::TemporaryFile;

/// Backing storage of a source
enum SourceKind {
    /// Shared or static memory
    Memory(Bytes),
    /// An arena the source owns
    Buffer(ByteArena),
    /// A file opened read-only by path
    File(File),
    /// A cloned handle of a [`TemporaryFile`]; the file is deleted by its owner
    TemporaryFile(File),
    /// A window into another source
    SubRange { parent: Source, base: u64 },
}

/// An immutable, randomly readable view of bytes
///
/// Cloning is a reference-count bump; clones share the backing storage.
/// `read_at` has no side effects, so one source can be read from many
/// threads at once, each reader keeping its own offset.
#[derive(Clone)]
pub struct Source {
    kind: Arc<SourceKind>,
    /// Fixed at construction
    size: u64,
    name: Option<Arc<str>>,
}

impl Source {
    fn new(kind: SourceKind, size: u64) -> Self {
        Self {
            kind: Arc::new(kind),
            size,
            name: None,
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a source over shared memory without copying
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let size = bytes.len() as u64;
        Self::new(SourceKind::Memory(bytes), size)
    }

    /// Create a source over static data without copying
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::from_bytes(Bytes::from_static(bytes))
    }

    /// Create a source that owns `buffer`
    pub fn from_buffer(buffer: ByteArena) -> Self {
        let size = buffer.size() as u64;
        Self::new(SourceKind::Buffer(buffer), size)
    }

    /// Open a file read-only
    ///
    /// Returns `None` if the path does not exist, is not a regular file, or
    /// cannot be opened.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let opened = File::open(path).and_then(|file| {
            let metadata = file.metadata()?;
            if !metadata.is_file() {
                return Err(io::Error::new(io::ErrorKind::Other, "not a regular file"));
            }
            Ok((file, metadata.len()))
        });
        match opened {
            Ok((file, size)) => {
                Some(Self::new(SourceKind::File(file), size).with_name(path.to_string_lossy()))
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot open source");
                None
            }
        }
    }

    /// Create a source reading the current contents of a temporary file
    ///
    /// The size is taken now; later writes past it are not visible.
    pub fn from_temporary_file(file: &TemporaryFile) -> Option<Self> {
        let opened = file
            .file()
            .try_clone()
            .and_then(|handle| Ok((handle.metadata()?.len(), handle)));
        match opened {
            Ok((size, handle)) => Some(
                Self::new(SourceKind::TemporaryFile(handle), size)
                    .with_name(file.path().to_string_lossy()),
            ),
            Err(e) => {
                tracing::debug!(path = %file.path().display(), error = %e, "cannot open temporary source");
                None
            }
        }
    }

    /// Create a view of `size` bytes of `parent` starting at `base`
    ///
    /// The range is clamped to the parent: `base` to `parent.size()`, then
    /// `size` to what remains. Nested ranges point straight at the root
    /// source.
    pub fn from_subrange(parent: &Source, base: u64, size: u64) -> Self {
        let base = base.min(parent.size);
        let size = size.min(parent.size - base);
        let (root, base) = match &*parent.kind {
            SourceKind::SubRange {
                parent: root,
                base: parent_base,
            } => (root.clone(), parent_base + base),
            _ => (parent.clone(), base),
        };
        Self::new(SourceKind::SubRange { parent: root, base }, size)
    }

    /// Label this handle with a descriptive name
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Descriptive name (a path for file sources), if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The whole contents as a slice, for sources that live in memory
    pub fn data(&self) -> Option<&[u8]> {
        match &*self.kind {
            SourceKind::Memory(bytes) => Some(&bytes[..]),
            SourceKind::Buffer(buffer) => Some(buffer.as_slice()),
            _ => None,
        }
    }

    /// Copy bytes starting at `offset` into `buf`
    ///
    /// Returns the number of bytes copied, which is short (possibly zero)
    /// when the range runs past the end of the source.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        if offset >= self.size || buf.is_empty() {
            return 0;
        }
        let len = (buf.len() as u64).min(self.size - offset) as usize;
        let buf = &mut buf[..len];
        match &*self.kind {
            SourceKind::Memory(bytes) => copy_from(bytes, offset, buf),
            SourceKind::Buffer(buffer) => copy_from(buffer.as_slice(), offset, buf),
            SourceKind::File(file) | SourceKind::TemporaryFile(file) => {
                platform::read_full_at(file, offset, buf)
            }
            SourceKind::SubRange { parent, base } => parent.read_at(base + offset, buf),
        }
    }

    /// Fill all of `buf` from `offset`, or report failure
    pub fn read_all_at(&self, offset: u64, buf: &mut [u8]) -> bool {
        self.read_at(offset, buf) == buf.len()
    }

    /// Read the whole source into a fresh arena
    ///
    /// The arena's size equals the source size and at least `padding` zero
    /// bytes follow the data inside its capacity (see [`ByteArena::padded`]).
    pub fn to_buffer(&self, padding: usize) -> Result<ByteArena> {
        let size = self.memory_size()?;
        let capacity = size.checked_add(padding).ok_or_else(too_large)?;
        // A fresh arena is zero-filled, so the padding needs no extra work
        let mut buffer = ByteArena::new();
        buffer.reserve(capacity);
        buffer.resize(size);
        let actual = self.read_at(0, buffer.as_mut_slice());
        if actual != size {
            return Err(YpakError::ShortRead {
                expected: self.size,
                actual: actual as u64,
            });
        }
        Ok(buffer)
    }

    /// Read the whole source as text, replacing invalid UTF-8
    pub fn read_to_string(&self) -> Result<String> {
        let mut bytes = vec![0u8; self.memory_size()?];
        let actual = self.read_at(0, &mut bytes);
        if actual != bytes.len() {
            return Err(YpakError::ShortRead {
                expected: self.size,
                actual: actual as u64,
            });
        }
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    fn memory_size(&self) -> Result<usize> {
        usize::try_from(self.size).map_err(|_| too_large())
    }

    fn kind_name(&self) -> &'static str {
        match &*self.kind {
            SourceKind::Memory(_) => "memory",
            SourceKind::Buffer(_) => "buffer",
            SourceKind::File(_) => "file",
            SourceKind::TemporaryFile(_) => "temporary_file",
            SourceKind::SubRange { .. } => "subrange",
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("kind", &self.kind_name())
            .field("size", &self.size)
            .field("name", &self.name)
            .finish()
    }
}

fn copy_from(data: &[u8], offset: u64, buf: &mut [u8]) -> usize {
    let start = offset as usize;
    buf.copy_from_slice(&data[start..start + buf.len()]);
    buf.len()
}

fn too_large() -> YpakError {
    YpakError::Io(io::Error::new(
        io::ErrorKind::OutOfMemory,
        "source does not fit in memory",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_source_is_direct() {
        let source = Source::from_static(b"hello");
        assert_eq!(source.size(), 5);
        assert_eq!(source.data(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_read_past_end_is_short() {
        let source = Source::from_static(b"abcdef");
        let mut buf = [0u8; 4];
        assert_eq!(source.read_at(4, &mut buf), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(source.read_at(6, &mut buf), 0);
        assert_eq!(source.read_at(100, &mut buf), 0);
    }

    #[test]
    fn test_subrange_clamps() {
        let parent = Source::from_static(b"0123456789");
        assert_eq!(Source::from_subrange(&parent, 8, 5).size(), 2);
        assert_eq!(Source::from_subrange(&parent, 20, 5).size(), 0);
    }

    #[test]
    fn test_subrange_has_no_direct_data() {
        let parent = Source::from_static(b"0123456789");
        let sub = Source::from_subrange(&parent, 2, 3);
        assert!(sub.data().is_none());
        assert_eq!(sub.to_buffer(0).unwrap().as_slice(), b"234");
    }

    #[test]
    fn test_nested_subrange_collapses() {
        let parent = Source::from_static(b"0123456789");
        let outer = Source::from_subrange(&parent, 2, 6);
        let inner = Source::from_subrange(&outer, 1, 3);
        assert_eq!(inner.to_buffer(0).unwrap().as_slice(), b"345");
        assert!(matches!(&*inner.kind, SourceKind::SubRange { base: 3, .. }));
    }

    #[test]
    fn test_subrange_outlives_parent_handle() {
        let sub = {
            let parent = Source::from_buffer(ByteArena::from_slice(b"shared bytes"));
            Source::from_subrange(&parent, 7, 5)
        };
        assert_eq!(sub.read_to_string().unwrap(), "bytes");
    }

    #[test]
    fn test_from_path_missing() {
        assert!(Source::from_path("no_such_file").is_none());
    }

    #[test]
    fn test_from_path_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Source::from_path(dir.path()).is_none());
    }

    #[test]
    fn test_temporary_file_source() {
        let temp = TemporaryFile::new().unwrap();
        temp.file().write_all(b"scratch").unwrap();

        let source = Source::from_temporary_file(&temp).unwrap();
        assert_eq!(source.size(), 7);
        assert!(source.data().is_none());
        assert_eq!(source.read_to_string().unwrap(), "scratch");
    }

    #[test]
    fn test_to_buffer_padding_is_zero() {
        let source = Source::from_static(b"text");
        let buffer = source.to_buffer(1).unwrap();
        assert_eq!(buffer.size(), 4);
        assert_eq!(buffer.padded(1), Some(&b"text\0"[..]));
    }

    #[test]
    fn test_read_to_string_lossy() {
        let source = Source::from_static(b"ok\xff");
        assert_eq!(source.read_to_string().unwrap(), "ok\u{fffd}");
    }

    #[test]
    fn test_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Source>();
    }
}
