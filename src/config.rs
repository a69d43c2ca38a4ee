//! Configuration for ypak
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, YpakError};
use crate::storage::UseFileSystem;

/// Highest zlib effort level
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Main configuration shared by [`crate::Storage`] and [`crate::PackageWriter`]
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Resolver Configuration
    // -------------------------------------------------------------------------
    /// Where the real filesystem sits relative to buffers and packages
    pub use_file_system: UseFileSystem,

    // -------------------------------------------------------------------------
    // Package Configuration
    // -------------------------------------------------------------------------
    /// zlib effort level used when committing packages (0..=9)
    ///
    /// Packages are byte-identical for identical inputs only at a fixed
    /// level, so this stays pinned unless the caller overrides it.
    pub compression_level: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_file_system: UseFileSystem::After,
            compression_level: MAX_COMPRESSION_LEVEL,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that all values are in range
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(YpakError::Config(format!(
                "compression level {} is out of range 0..={}",
                self.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the filesystem placement
    pub fn use_file_system(mut self, use_file_system: UseFileSystem) -> Self {
        self.config.use_file_system = use_file_system;
        self
    }

    /// Set the zlib effort level
    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression_level = level;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.use_file_system, UseFileSystem::After);
        assert_eq!(config.compression_level, 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .use_file_system(UseFileSystem::Never)
            .compression_level(1)
            .build();
        assert_eq!(config.use_file_system, UseFileSystem::Never);
        assert_eq!(config.compression_level, 1);
    }

    #[test]
    fn test_validate_rejects_level() {
        let config = Config::builder().compression_level(10).build();
        assert!(matches!(config.validate(), Err(YpakError::Config(_))));
    }
}
