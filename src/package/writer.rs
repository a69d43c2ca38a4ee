//! Package Writer
//!
//! Stages named sources and commits them into a new container file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, YpakError};
use crate::io::{Source, Writer};

use super::compression::{self, CompressionMethod};
use super::{PackageIndexEntry, ENTRY_FIXED_SIZE, HEADER_SIZE, MAGIC};

/// Builder for a package file
///
/// The target is created (or truncated) up front; nothing useful lands in
/// it until [`PackageWriter::commit`]. A writer dropped without a
/// successful commit deletes the file.
pub struct PackageWriter {
    /// Output file path
    path: PathBuf,
    /// `None` once committed
    writer: Option<Writer<'static>>,
    /// Staged entries in insertion order
    entries: Vec<(String, Source)>,
    names: HashSet<String>,
    /// zlib effort level
    level: u32,
}

impl PackageWriter {
    /// Create a package writer with the default configuration
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_config(path, &Config::default())
    }

    pub fn create_with_config(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let writer = Writer::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            entries: Vec::new(),
            names: HashSet::new(),
            level: config.compression_level,
        })
    }

    /// Stage `source` under `name`
    ///
    /// The source is read at commit time, not now.
    pub fn add(&mut self, name: impl Into<String>, source: Source) -> Result<()> {
        let name = name.into();
        if name.len() > u16::MAX as usize {
            return Err(YpakError::NameTooLong(name.len()));
        }
        if self.entries.len() >= u32::MAX as usize {
            return Err(YpakError::TooManyEntries);
        }
        if !self.names.insert(name.clone()) {
            return Err(YpakError::DuplicateEntry(name));
        }
        self.entries.push((name, source));
        Ok(())
    }

    /// Stage a file from disk, named by its path as given
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let source = Source::from_path(path)
            .ok_or_else(|| YpakError::NotFound(path.display().to_string()))?;
        self.add(path.to_string_lossy().into_owned(), source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the container
    ///
    /// Either the whole package is written and synced, or the target file
    /// is removed and the error returned.
    pub fn commit(mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        match self.write_package(&mut writer) {
            Ok(entries) => {
                let stored: u64 = entries.iter().map(|e| e.stored_size).sum();
                let uncompressed: u64 = entries.iter().map(|e| e.uncompressed_size).sum();
                tracing::info!(
                    path = %self.path.display(),
                    entries = entries.len(),
                    uncompressed,
                    stored,
                    size = writer.size(),
                    "package committed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "package commit failed, removing partial file");
                if let Err(unlink_err) = writer.unlink() {
                    tracing::warn!(path = %self.path.display(), error = %unlink_err, "failed to remove partial package");
                }
                Err(e)
            }
        }
    }

    /// Lay out the index, stream the blobs, then fill in the index
    ///
    /// Blob offsets depend only on the names, so the index region is
    /// reserved first and written last.
    fn write_package(&self, writer: &mut Writer<'static>) -> Result<Vec<PackageIndexEntry>> {
        let index_end = HEADER_SIZE
            + self
                .entries
                .iter()
                .map(|(name, _)| ENTRY_FIXED_SIZE + name.len() as u64)
                .sum::<u64>();

        writer.resize(index_end)?;
        // Cannot fail: the resize above made `index_end` the current size
        let positioned = writer.seek(index_end);
        debug_assert!(positioned);

        let mut index = Vec::with_capacity(self.entries.len());
        for (name, source) in &self.entries {
            let data = source.to_buffer(0)?;
            let blob_offset = writer.offset();
            let (method, stored_size) = match compression::compress_if_beneficial(&data, self.level) {
                Some(compressed) => {
                    writer.write(&compressed)?;
                    (CompressionMethod::Zlib, compressed.len() as u64)
                }
                None => {
                    writer.write(&data)?;
                    (CompressionMethod::None, data.size() as u64)
                }
            };
            tracing::debug!(
                entry = %name,
                size = data.size(),
                stored = stored_size,
                method = method.name(),
                "package entry written"
            );
            index.push(PackageIndexEntry {
                name: name.clone(),
                uncompressed_size: data.size() as u64,
                stored_size,
                method: method.as_u8(),
                blob_offset,
            });
        }

        writer.write_at(0, &encode_index(&index))?;
        writer.sync()?;
        Ok(index)
    }
}

impl Drop for PackageWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            tracing::warn!(path = %self.path.display(), "package writer dropped without commit, removing file");
            if let Err(e) = writer.unlink() {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove uncommitted package");
            }
        }
    }
}

impl std::fmt::Debug for PackageWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageWriter")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .field("level", &self.level)
            .finish()
    }
}

/// Header and index bytes for `entries`
fn encode_index(entries: &[PackageIndexEntry]) -> Vec<u8> {
    let size = HEADER_SIZE + entries.iter().map(|e| e.index_size()).sum::<u64>();
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&entry.stored_size.to_le_bytes());
        out.push(entry.method);
        out.extend_from_slice(&entry.blob_offset.to_le_bytes());
    }
    out
}
