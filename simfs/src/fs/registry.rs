//! Zone registry: which file systems are visible where.
//!
//! Simulated actors live in network zones, and each zone sees a set of
//! file systems. The registry is an explicit lookup table constructed at
//! simulation setup and passed to whatever needs routing - there is no
//! ambient singleton. It performs lookups only; it never owns partition
//! or storage state.

use crate::error::{FsError, FsResult};
use crate::fs::file_system::FileSystem;
use std::collections::{BTreeMap, HashMap};

/// Process-wide table mapping zone names to the file systems they see.
#[derive(Debug, Default)]
pub struct FileSystemRegistry {
    by_zone: HashMap<String, BTreeMap<String, FileSystem>>,
}

impl FileSystemRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a file system visible in a zone.
    ///
    /// Fails with [`FsError::DuplicateFileSystem`] if a file system with
    /// the same name is already registered there.
    pub fn register(&mut self, zone: &str, fs: FileSystem) -> FsResult<()> {
        let entry = self.by_zone.entry(zone.to_string()).or_default();
        let name = fs.get_name();
        if entry.contains_key(&name) {
            return Err(FsError::DuplicateFileSystem {
                zone: zone.to_string(),
                name,
            });
        }
        tracing::debug!(zone, fs = %name, "file system registered");
        entry.insert(name, fs);
        Ok(())
    }

    /// All file systems visible in a zone, in name order.
    pub fn file_systems_in_zone(&self, zone: &str) -> Vec<FileSystem> {
        self.by_zone
            .get(zone)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up one file system in a zone by name.
    pub fn file_system_in_zone_by_name(&self, zone: &str, name: &str) -> FsResult<FileSystem> {
        self.file_system_in_zone_by_name_or_null(zone, name)
            .ok_or_else(|| FsError::NoSuchFileSystem {
                zone: zone.to_string(),
                name: name.to_string(),
            })
    }

    /// Look up one file system in a zone by name, or `None`.
    pub fn file_system_in_zone_by_name_or_null(
        &self,
        zone: &str,
        name: &str,
    ) -> Option<FileSystem> {
        self.by_zone.get(zone).and_then(|m| m.get(name)).cloned()
    }

    /// Drop every registration for a zone (simulation teardown).
    pub fn unregister_zone(&mut self, zone: &str) {
        self.by_zone.remove(zone);
    }

    /// Names of all zones with at least one registration.
    pub fn zones(&self) -> Vec<String> {
        let mut zones: Vec<String> = self.by_zone.keys().cloned().collect();
        zones.sort();
        zones
    }
}
