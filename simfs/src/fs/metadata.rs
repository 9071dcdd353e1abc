//! Per-file metadata and stat snapshots.

use std::collections::HashMap;
use std::time::Duration;

/// Metadata kept by a partition for each file.
///
/// Sizes are tracked two ways: `current_size` is what a reader observes,
/// and the ongoing-write table records the target end offset of every
/// write still in flight. Space accounting charges the larger of the two
/// so a partition can never oversell bytes to overlapping writers.
#[derive(Debug, Clone)]
pub(crate) struct FileMetadata {
    pub(crate) current_size: u64,
    /// write id -> target end offset of that write.
    pub(crate) ongoing_writes: HashMap<u64, u64>,
    pub(crate) creation_date: Duration,
    pub(crate) modification_date: Duration,
    pub(crate) access_date: Duration,
    /// Number of open handles on this file.
    pub(crate) refcount: u32,
    /// Whether the eviction policy may remove this file under pressure.
    pub(crate) evictable: bool,
}

impl FileMetadata {
    pub(crate) fn new(size: u64, now: Duration) -> Self {
        Self {
            current_size: size,
            ongoing_writes: HashMap::new(),
            creation_date: now,
            modification_date: now,
            access_date: now,
            refcount: 0,
            evictable: true,
        }
    }

    /// Bytes this file charges against the partition: its resident size
    /// or the furthest in-flight write end, whichever is larger.
    pub(crate) fn charged(&self) -> u64 {
        self.ongoing_writes
            .values()
            .copied()
            .max()
            .map_or(self.current_size, |end| end.max(self.current_size))
    }

    pub(crate) fn stat(&self) -> FileStat {
        FileStat {
            size_in_bytes: self.current_size,
            last_access_date: self.access_date,
            last_modification_date: self.modification_date,
            refcount: self.refcount,
        }
    }
}

/// A point-in-time snapshot of a file's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// The file's size in bytes.
    pub size_in_bytes: u64,
    /// Simulated time of the last read or write.
    pub last_access_date: Duration,
    /// Simulated time of the last size-changing operation.
    pub last_modification_date: Duration,
    /// Number of handles currently open on the file.
    pub refcount: u32,
}
