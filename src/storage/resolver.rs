//! Storage Resolver
//!
//! Maps resource names onto sources from every attached provider.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::io::Source;
use crate::memory::ByteArena;
use crate::package::PackageReader;

use super::UseFileSystem;

/// Layered resource resolver
///
/// ## Concurrency:
/// - Attaching takes `&mut self`, opening takes `&self`
/// - Build the storage first, then share it (e.g. in an `Arc`) for reads
/// - Callers that keep mounting while others read bring their own lock
#[derive(Debug)]
pub struct Storage {
    use_file_system: UseFileSystem,
    /// Attached buffers, highest priority after a `Before` filesystem
    buffers: HashMap<String, Source>,
    /// Mounted packages, oldest first; searched from the end
    packages: Vec<PackageReader>,
}

impl Storage {
    pub fn new(use_file_system: UseFileSystem) -> Self {
        Self {
            use_file_system,
            buffers: HashMap::new(),
            packages: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.use_file_system)
    }

    /// Register `buffer` under `name`, replacing any earlier buffer
    pub fn attach_buffer(&mut self, name: impl Into<String>, buffer: ByteArena) {
        let name = name.into();
        let source = Source::from_buffer(buffer).with_name(name.as_str());
        tracing::debug!(name = %name, size = source.size(), "buffer attached");
        self.buffers.insert(name, source);
    }

    /// Mount the package at `path` on top of the package stack
    pub fn attach_package(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let package = PackageReader::create(path)?;
        self.mount(package);
        Ok(())
    }

    /// Mount a package held in any source
    pub fn attach_package_source(&mut self, source: Source) -> Result<()> {
        let package = PackageReader::from_source(source)?;
        self.mount(package);
        Ok(())
    }

    fn mount(&mut self, package: PackageReader) {
        tracing::debug!(
            package = %package.name(),
            entries = package.len(),
            depth = self.packages.len() + 1,
            "package mounted"
        );
        self.packages.push(package);
    }

    /// Resolve `name`
    ///
    /// Returns:
    /// - `Ok(Some(source))`: found in some provider
    /// - `Ok(None)`: no provider has it
    /// - `Err(e)`: a package entry exists but could not be decoded
    pub fn open(&self, name: &str) -> Result<Option<Source>> {
        if self.use_file_system == UseFileSystem::Before {
            if let Some(source) = Source::from_path(name) {
                return Ok(Some(source));
            }
        }

        if let Some(source) = self.buffers.get(name) {
            return Ok(Some(source.clone()));
        }

        // Newest mount shadows older ones
        for package in self.packages.iter().rev() {
            if let Some(index) = package.find(name) {
                return package.open(index).map(Some);
            }
        }

        if self.use_file_system == UseFileSystem::After {
            if let Some(source) = Source::from_path(name) {
                return Ok(Some(source));
            }
        }

        Ok(None)
    }

    /// Every name visible through buffers and packages, sorted
    ///
    /// Filesystem names are not listed.
    pub fn names(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = self.buffers.keys().map(String::as_str).collect();
        for package in &self.packages {
            names.extend(package.names());
        }
        names.into_iter().map(str::to_string).collect()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn use_file_system(&self) -> UseFileSystem {
        self.use_file_system
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
