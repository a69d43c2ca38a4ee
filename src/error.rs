//! Error types for ypak
//!
//! Provides a unified error type for all fallible operations.
//!
//! Expected, common failures (end of data, short reads, missing resources)
//! are not errors: cursors return `bool`/byte counts and lookups return
//! `Option`. Running out of memory is not represented at all; it aborts
//! the process (see [`crate::memory::ByteArena`]).

use thiserror::Error;

/// Result type alias using YpakError
pub type Result<T> = std::result::Result<T, YpakError>;

/// Unified error type for ypak operations
#[derive(Debug, Error)]
pub enum YpakError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("Write offset {offset} is past the end of the written data ({size} bytes)")]
    InvalidOffset { offset: u64, size: u64 },

    // -------------------------------------------------------------------------
    // Package Format Errors
    // -------------------------------------------------------------------------
    #[error("Invalid package {package}: {reason}")]
    InvalidPackage { package: String, reason: String },

    #[error("Failed to decompress entry {entry}: {reason}")]
    Decompression { entry: String, reason: String },

    #[error("Entry {entry} uses unsupported compression method {method}")]
    UnsupportedCompression { entry: String, method: u8 },

    #[error("No entry #{0} in package")]
    NoSuchEntry(usize),

    // -------------------------------------------------------------------------
    // Package Writer Errors
    // -------------------------------------------------------------------------
    #[error("Duplicate package entry: {0}")]
    DuplicateEntry(String),

    #[error("Entry name is too long: {0} bytes (max 65535)")]
    NameTooLong(usize),

    #[error("Too many package entries")]
    TooManyEntries,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl YpakError {
    /// Shorthand for a malformed container
    pub(crate) fn invalid_package(package: impl Into<String>, reason: impl Into<String>) -> Self {
        YpakError::InvalidPackage {
            package: package.into(),
            reason: reason.into(),
        }
    }
}
