//! Writer
//!
//! Sequential cursor that writes into an arena or a file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{Result, YpakError};
use crate::memory::ByteArena;

use super::platform;
use super::{Source, TemporaryFile};

enum Target<'a> {
    Buffer(&'a mut ByteArena),
    /// `path` is set only for files this writer may delete
    File { file: File, path: Option<PathBuf> },
}

/// Sequential cursor over a writable target
///
/// `offset` is where the next `write` lands; `size` is the furthest byte
/// written so far. Writing past `size` grows the target.
pub struct Writer<'a> {
    target: Target<'a>,
    offset: u64,
    size: u64,
}

impl<'a> Writer<'a> {
    /// Write into `buffer`, which is cleared first
    pub fn from_buffer(buffer: &'a mut ByteArena) -> Self {
        buffer.clear();
        Self {
            target: Target::Buffer(buffer),
            offset: 0,
            size: 0,
        }
    }

    /// Create or truncate the file at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Writer<'static>> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Writer {
            target: Target::File {
                file,
                path: Some(path.to_path_buf()),
            },
            offset: 0,
            size: 0,
        })
    }

    /// Write into a temporary file, truncating it first
    pub fn from_temporary_file(file: &'a mut TemporaryFile) -> Result<Self> {
        let handle = file.file().try_clone()?;
        handle.set_len(0)?;
        Ok(Self {
            target: Target::File {
                file: handle,
                path: None,
            },
            offset: 0,
            size: 0,
        })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Move the cursor; fails past `size`
    pub fn seek(&mut self, offset: u64) -> bool {
        if offset > self.size {
            return false;
        }
        self.offset = offset;
        true
    }

    /// Write `data` at the cursor and advance past it
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.put(self.offset, data)?;
        self.offset += data.len() as u64;
        Ok(())
    }

    /// Write `data` at `offset` without moving the cursor
    ///
    /// `offset` may equal `size` (appending) but not exceed it.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if offset > self.size {
            return Err(YpakError::InvalidOffset {
                offset,
                size: self.size,
            });
        }
        self.put(offset, data)
    }

    /// Copy the whole of `source` at the cursor
    pub fn write_source(&mut self, source: &Source) -> Result<()> {
        if let Some(data) = source.data() {
            return self.write(data);
        }

        let mut chunk = vec![0u8; ByteArena::granularity()];
        let mut position = 0u64;
        while position < source.size() {
            let count = source.read_at(position, &mut chunk);
            if count == 0 {
                return Err(YpakError::ShortRead {
                    expected: source.size(),
                    actual: position,
                });
            }
            self.write(&chunk[..count])?;
            position += count as u64;
        }
        Ok(())
    }

    /// Pre-allocate room for `capacity` bytes
    ///
    /// Grows an arena's capacity; files are left alone.
    pub fn reserve(&mut self, capacity: u64) -> Result<()> {
        if let Target::Buffer(buffer) = &mut self.target {
            buffer.reserve(to_usize(capacity)?);
        }
        Ok(())
    }

    /// Set the written size to `size`, zero-extending or truncating
    ///
    /// The cursor is pulled back if it would land past the new end.
    pub fn resize(&mut self, size: u64) -> Result<()> {
        match &mut self.target {
            Target::Buffer(buffer) => {
                let new_size = to_usize(size)?;
                if new_size > buffer.size() {
                    let old_size = buffer.size();
                    buffer.resize(new_size);
                    buffer[old_size..].fill(0);
                } else {
                    buffer.resize(new_size);
                }
            }
            Target::File { file, .. } => file.set_len(size)?,
        }
        self.size = size;
        self.offset = self.offset.min(size);
        Ok(())
    }

    /// Flush file contents to disk
    pub fn sync(&mut self) -> Result<()> {
        if let Target::File { file, .. } = &self.target {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Close the target and delete it from disk
    ///
    /// Only files opened with [`Writer::create`] are deleted; arenas and
    /// temporary files are left to their owners.
    pub fn unlink(self) -> Result<()> {
        if let Target::File {
            file,
            path: Some(path),
        } = self.target
        {
            drop(file);
            fs::remove_file(&path)?;
            tracing::debug!(path = %path.display(), "unlinked written file");
        }
        Ok(())
    }

    fn put(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(data.len() as u64)
            .ok_or_else(|| YpakError::InvalidOffset {
                offset,
                size: self.size,
            })?;
        match &mut self.target {
            Target::Buffer(buffer) => {
                let end = to_usize(end)?;
                if end > buffer.size() {
                    buffer.resize(end);
                }
                let start = offset as usize;
                buffer[start..end].copy_from_slice(data);
            }
            Target::File { file, .. } => platform::write_all_at(file, offset, data)?,
        }
        self.size = self.size.max(end);
        Ok(())
    }
}

impl std::fmt::Debug for Writer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match &self.target {
            Target::Buffer(_) => "buffer",
            Target::File { .. } => "file",
        };
        f.debug_struct("Writer")
            .field("target", &target)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        YpakError::Io(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "write target does not fit in memory",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_writer_clears() {
        let mut buffer = ByteArena::from_slice(b"old contents");
        {
            let mut writer = Writer::from_buffer(&mut buffer);
            writer.write(b"new").unwrap();
        }
        assert_eq!(buffer.as_slice(), b"new");
    }

    #[test]
    fn test_overwrite_after_seek() {
        let mut buffer = ByteArena::new();
        let mut writer = Writer::from_buffer(&mut buffer);
        writer.write(b"abcdef").unwrap();
        assert!(writer.seek(2));
        writer.write(b"XY").unwrap();
        assert_eq!(writer.offset(), 4);
        assert_eq!(writer.size(), 6);
        assert!(!writer.seek(7));
        drop(writer);
        assert_eq!(buffer.as_slice(), b"abXYef");
    }

    #[test]
    fn test_write_at_rejects_gap() {
        let mut buffer = ByteArena::new();
        let mut writer = Writer::from_buffer(&mut buffer);
        writer.write(b"abc").unwrap();
        writer.write_at(3, b"d").unwrap();
        assert_eq!(writer.offset(), 3);
        assert!(matches!(
            writer.write_at(5, b"x"),
            Err(YpakError::InvalidOffset { offset: 5, size: 4 })
        ));
    }

    #[test]
    fn test_resize_zero_fills() {
        let mut buffer = ByteArena::new();
        let mut writer = Writer::from_buffer(&mut buffer);
        writer.write(b"abc").unwrap();
        writer.resize(1).unwrap();
        writer.resize(3).unwrap();
        assert_eq!(writer.offset(), 1);
        drop(writer);
        assert_eq!(buffer.as_slice(), b"a\0\0");
    }

    #[test]
    fn test_write_source_chunked() {
        let data: Vec<u8> = (0..3 * ByteArena::granularity() + 7)
            .map(|i| (i % 251) as u8)
            .collect();
        let parent = Source::from_bytes(data.clone());
        let sub = Source::from_subrange(&parent, 0, parent.size());

        let mut buffer = ByteArena::new();
        Writer::from_buffer(&mut buffer).write_source(&sub).unwrap();
        assert_eq!(buffer.as_slice(), &data[..]);
    }

    #[test]
    fn test_unlink_removes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.bin");
        let mut writer = Writer::create(&path).unwrap();
        writer.write(b"partial").unwrap();
        assert!(path.exists());
        writer.unlink().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_temporary_file_writer() {
        let mut temp = TemporaryFile::new().unwrap();
        {
            let mut writer = Writer::from_temporary_file(&mut temp).unwrap();
            writer.write(b"first pass").unwrap();
        }
        {
            let mut writer = Writer::from_temporary_file(&mut temp).unwrap();
            writer.write(b"second").unwrap();
            writer.sync().unwrap();
            writer.unlink().unwrap();
        }
        let source = Source::from_temporary_file(&temp).unwrap();
        assert_eq!(source.read_to_string().unwrap(), "second");
    }
}
