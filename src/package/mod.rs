//! Package Module
//!
//! The `YPK1` container: named, optionally compressed blobs behind a flat
//! index that is loaded whole at open time.
//!
//! ## Responsibilities
//! - Build containers from staged sources, all or nothing
//! - Validate container indexes before any entry is served
//! - Serve raw entries as zero-copy sub-ranges, inflate zlib entries on demand
//!
//! ## File Format (little-endian)
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Header                                             │
//! │ ┌───────────┬────────────────┐                     │
//! │ │ Magic (4) │ EntryCount (4) │                     │
//! │ └───────────┴────────────────┘                     │
//! ├────────────────────────────────────────────────────┤
//! │ Index (EntryCount times)                           │
//! │ ┌─────────┬──────┬────────┬────────┬────┬────────┐ │
//! │ │NameLen 2│ Name │ Size 8 │Stored 8│ M 1│Offset 8│ │
//! │ └─────────┴──────┴────────┴────────┴────┴────────┘ │
//! ├────────────────────────────────────────────────────┤
//! │ Blobs: stored bytes, contiguous, in index order    │
//! └────────────────────────────────────────────────────┘
//! ```
//! `Offset` is absolute from the start of the container. `M` is the
//! compression method id (0 = raw, 1 = zlib).

pub mod compression;
mod reader;
mod writer;

pub use compression::CompressionMethod;
pub use reader::PackageReader;
pub use writer::PackageWriter;

/// Magic bytes identifying a package
pub const MAGIC: &[u8; 4] = b"YPK1";

/// Magic + entry count
pub const HEADER_SIZE: u64 = 4 + 4;

/// Index entry size excluding the name bytes
pub const ENTRY_FIXED_SIZE: u64 = 2 + 8 + 8 + 1 + 8;

/// One parsed index entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIndexEntry {
    pub name: String,
    pub uncompressed_size: u64,
    pub stored_size: u64,
    /// Raw method id as stored; see [`PackageIndexEntry::compression`]
    pub method: u8,
    pub blob_offset: u64,
}

impl PackageIndexEntry {
    /// The compression method, or `None` for an id this build does not know
    pub fn compression(&self) -> Option<CompressionMethod> {
        CompressionMethod::from_u8(self.method)
    }

    /// Bytes this entry occupies in the index
    pub(crate) fn index_size(&self) -> u64 {
        ENTRY_FIXED_SIZE + self.name.len() as u64
    }
}
