//! Error types for simulated file-system operations.

use crate::storage::RaidLevel;
use thiserror::Error;

/// Errors reported by file-system, partition and storage operations.
///
/// Every error is raised synchronously at the point of the violated
/// precondition. Space and eviction failures never partially commit:
/// an operation that returns an error leaves the partition untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// No mounted partition matches the given path.
    #[error("no partition matches path '{0}'")]
    NoSuchPartition(String),

    /// The file does not exist.
    #[error("no such file '{0}'")]
    NoSuchFile(String),

    /// The directory does not exist.
    #[error("no such directory '{0}'")]
    NoSuchDirectory(String),

    /// The mount point overlaps an existing mount.
    #[error("mount point '{0}' conflicts with existing mount '{1}'")]
    MountConflict(String, String),

    /// Opening another file would exceed the file system's handle limit.
    #[error("too many open files (limit is {0})")]
    TooManyOpenFiles(usize),

    /// The partition cannot hold the requested bytes, even after eviction.
    #[error("insufficient space on partition '{partition}' ({needed} bytes needed, {available} free)")]
    InsufficientSpace {
        /// Name of the partition that ran out of space.
        partition: String,
        /// Bytes the operation needed.
        needed: u64,
        /// Bytes that were free (or reclaimable) at the time.
        available: u64,
    },

    /// The directory still contains files.
    #[error("directory '{0}' is not empty")]
    DirectoryNotEmpty(String),

    /// A seek resolved to a position before byte 0.
    #[error("invalid seek to negative offset {0}")]
    InvalidSeek(i64),

    /// The storage's disk count cannot support the requested RAID level.
    #[error("RAID level {level} requires at least {required} disks ({actual} present)")]
    UnsupportedRaidLevel {
        /// The rejected level.
        level: RaidLevel,
        /// Minimum disk count for that level.
        required: usize,
        /// Disks actually attached.
        actual: usize,
    },

    /// A file with that path already exists.
    #[error("file '{0}' already exists")]
    FileAlreadyExists(String),

    /// A directory with that path already exists.
    #[error("directory '{0}' already exists")]
    DirectoryAlreadyExists(String),

    /// The operation is not permitted on an open file.
    #[error("file '{0}' is currently open")]
    FileIsOpen(String),

    /// The move destination exists and overwriting was not requested.
    #[error("destination '{0}' already exists")]
    DestinationExists(String),

    /// Files cannot be moved across partitions.
    #[error("cannot move '{0}' to '{1}': source and destination are on different partitions")]
    InvalidMove(String, String),

    /// The path is malformed (e.g. not absolute, or names no file).
    #[error("invalid path '{0}'")]
    InvalidPath(String),

    /// The access mode string is not one of "r", "w" or "a", or the
    /// operation is not permitted under the file's access mode.
    #[error("invalid access mode '{0}'")]
    InvalidAccessMode(String),

    /// A file system with that name is already registered in the zone.
    #[error("file system '{name}' already registered in zone '{zone}'")]
    DuplicateFileSystem {
        /// Zone the registration targeted.
        zone: String,
        /// Name of the already-registered file system.
        name: String,
    },

    /// No file system with that name is registered in the zone.
    #[error("no file system '{name}' registered in zone '{zone}'")]
    NoSuchFileSystem {
        /// Zone that was searched.
        zone: String,
        /// Name that was looked up.
        name: String,
    },

    /// The simulation world backing this object has been dropped.
    #[error("simulation has been shut down")]
    SimulationShutdown,
}

/// A type alias for `Result<T, FsError>`.
pub type FsResult<T> = Result<T, FsError>;
