//! Package Reader
//!
//! Opens a container, validates its whole index up front, and serves
//! entries as sources.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, YpakError};
use crate::io::{Reader, Source};

use super::compression::{self, CompressionMethod};
use super::{PackageIndexEntry, ENTRY_FIXED_SIZE, HEADER_SIZE, MAGIC};

/// Reader for a package with its index held in memory
///
/// Blobs are read lazily from the container source.
#[derive(Debug)]
pub struct PackageReader {
    /// The whole container
    source: Source,
    /// Container name used in error messages
    name: String,
    entries: Vec<PackageIndexEntry>,
    /// Entry name → index
    lookup: HashMap<String, usize>,
}

impl PackageReader {
    /// Open the package at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = Source::from_path(path)
            .ok_or_else(|| YpakError::NotFound(path.display().to_string()))?;
        Self::from_source(source)
    }

    /// Parse a package held in any source
    pub fn from_source(source: Source) -> Result<Self> {
        let name = source.name().unwrap_or("<unnamed>").to_string();
        let entries = parse_index(&source, &name)?;

        let mut lookup = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if lookup.insert(entry.name.clone(), i).is_some() {
                return Err(YpakError::invalid_package(
                    &name,
                    format!("entry {} duplicates name {:?}", i, entry.name),
                ));
            }
        }

        tracing::debug!(package = %name, entries = entries.len(), size = source.size(), "package opened");
        Ok(Self {
            source,
            name,
            entries,
            lookup,
        })
    }

    /// Container name (its path when opened from disk)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in index order
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> &[PackageIndexEntry] {
        &self.entries
    }

    /// Index of the entry called `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Open entry `index`
    ///
    /// Raw entries share the container's storage; compressed entries are
    /// decoded into a fresh buffer on every call.
    pub fn open(&self, index: usize) -> Result<Source> {
        let entry = self
            .entries
            .get(index)
            .ok_or(YpakError::NoSuchEntry(index))?;
        let blob = Source::from_subrange(&self.source, entry.blob_offset, entry.stored_size);

        let method = entry
            .compression()
            .ok_or_else(|| YpakError::UnsupportedCompression {
                entry: entry.name.clone(),
                method: entry.method,
            })?;

        let opened = match method {
            CompressionMethod::None => blob,
            CompressionMethod::Zlib => {
                let stored = blob.to_buffer(0)?;
                let decoded = compression::decompress(&stored, method, entry.uncompressed_size)
                    .map_err(|e| YpakError::Decompression {
                        entry: entry.name.clone(),
                        reason: e.to_string(),
                    })?;
                Source::from_buffer(decoded)
            }
        };
        Ok(opened.with_name(entry.name.as_str()))
    }

    /// Open the entry called `name`, if there is one
    pub fn open_by_name(&self, name: &str) -> Result<Option<Source>> {
        self.find(name).map(|index| self.open(index)).transpose()
    }
}

// =============================================================================
// Index Parsing
// =============================================================================

fn parse_index(source: &Source, package: &str) -> Result<Vec<PackageIndexEntry>> {
    let invalid = |reason: String| YpakError::invalid_package(package, reason);
    let mut reader = Reader::new(source);

    let mut magic = [0u8; 4];
    if !reader.read_all(&mut magic) || &magic != MAGIC {
        return Err(invalid(format!("bad magic {:?}", magic)));
    }
    let count = reader
        .read_u32_le()
        .ok_or_else(|| invalid("truncated header".to_string()))?;

    // The count is untrusted; cap the allocation by what could possibly fit
    let fits = (source.size().saturating_sub(HEADER_SIZE) / ENTRY_FIXED_SIZE) as usize;
    let mut entries = Vec::with_capacity((count as usize).min(fits));

    for i in 0..count {
        let truncated = || invalid(format!("index truncated at entry {}", i));

        let name_len = reader.read_u16_le().ok_or_else(truncated)?;
        let mut name = vec![0u8; name_len as usize];
        if !reader.read_all(&mut name) {
            return Err(truncated());
        }
        let name = String::from_utf8(name)
            .map_err(|_| invalid(format!("entry {} name is not valid UTF-8", i)))?;

        let uncompressed_size = reader.read_u64_le().ok_or_else(truncated)?;
        let stored_size = reader.read_u64_le().ok_or_else(truncated)?;
        let method = reader.read_u8().ok_or_else(truncated)?;
        let blob_offset = reader.read_u64_le().ok_or_else(truncated)?;

        if method == CompressionMethod::None.as_u8() && stored_size != uncompressed_size {
            return Err(invalid(format!(
                "entry {} ({}) is stored raw but sizes differ: {} vs {}",
                i, name, stored_size, uncompressed_size
            )));
        }
        match blob_offset.checked_add(stored_size) {
            Some(end) if end <= source.size() => {}
            _ => {
                return Err(invalid(format!(
                    "entry {} ({}) blob at {}+{} is outside the package ({} bytes)",
                    i,
                    name,
                    blob_offset,
                    stored_size,
                    source.size()
                )))
            }
        }

        entries.push(PackageIndexEntry {
            name,
            uncompressed_size,
            stored_size,
            method,
            blob_offset,
        });
    }

    Ok(entries)
}
