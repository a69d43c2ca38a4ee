//! Storage Module
//!
//! Layered name resolution over in-memory buffers, mounted packages and
//! the real filesystem.
//!
//! ## Responsibilities
//! - Hold attached buffers and the stack of mounted packages
//! - Resolve a name to a [`crate::io::Source`] with fixed priority
//! - Place the filesystem before, after, or outside the other tiers
//!
//! ## Resolution Order
//! ```text
//! open(name)
//!   │
//!   ├─ UseFileSystem::Before ──▶ filesystem
//!   ├─ buffers (exact name)
//!   ├─ packages, newest mount first
//!   ├─ UseFileSystem::After ───▶ filesystem
//!   └─ None
//! ```

mod resolver;

pub use resolver::Storage;

/// Where the real filesystem sits in the resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UseFileSystem {
    /// Files on disk override buffers and packages
    Before,
    /// Files on disk are the fallback
    #[default]
    After,
    /// Only buffers and packages are visible
    Never,
}
