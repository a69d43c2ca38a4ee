//! I/O Module
//!
//! Byte sources and the cursors that read and write them.
//!
//! ## Responsibilities
//! - Immutable, shareable sources over memory, files and sub-ranges
//! - Sequential readers with line scanning and little-endian helpers
//! - Sequential writers over arenas and files
//! - Self-deleting temporary files
//!
//! ## Source Variants
//! ```text
//! ┌──────────────┬────────────┬──────────────────────────────┐
//! │ Variant      │ data()     │ Backing                      │
//! ├──────────────┼────────────┼──────────────────────────────┤
//! │ Memory       │ yes        │ bytes::Bytes (shared/static) │
//! │ Buffer       │ yes        │ owned ByteArena              │
//! │ File         │ no         │ read-only file handle        │
//! │ TemporaryFile│ no         │ clone of a TemporaryFile     │
//! │ SubRange     │ no         │ Arc of parent + base         │
//! └──────────────┴────────────┴──────────────────────────────┘
//! ```

mod platform;
mod reader;
mod source;
mod temporary;
mod writer;

pub use reader::{Reader, DEFAULT_LINE_CHUNK};
pub use source::Source;
pub use temporary::TemporaryFile;
pub use writer::Writer;
