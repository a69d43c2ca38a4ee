//! # ypak
//!
//! Resource storage for applications that ship their data in packages:
//! - Layered name resolution over buffers, packages and the filesystem
//! - The `YPK1` package container with optional zlib compression
//! - Zero-copy sources and sub-ranges over memory and files
//! - Page-granular byte arenas with process-wide accounting
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Storage::open(name)                       │
//! │          (buffers → packages → filesystem, by priority)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │  Packages   │          │  Filesystem  │
//!   │   (YPK1)    │          │  (File src)  │
//!   └──────┬──────┘          └──────┬───────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────────┐
//!   │ Source ──▶ Reader         Writer ──▶    │
//!   │ (Memory, Buffer, File, SubRange, Temp)  │
//!   └─────────────────────┬───────────────────┘
//!                         │
//!                         ▼
//!                 ┌──────────────┐
//!                 │  ByteArena   │
//!                 └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod memory;
pub mod io;
pub mod package;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, YpakError};
pub use config::{Config, ConfigBuilder};
pub use memory::{AllocationStats, ByteArena};
pub use io::{Reader, Source, TemporaryFile, Writer};
pub use package::{CompressionMethod, PackageIndexEntry, PackageReader, PackageWriter};
pub use storage::{Storage, UseFileSystem};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ypak
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
