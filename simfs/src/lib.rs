//! # simfs
//!
//! Simulated file systems for discrete-event simulation.
//!
//! `simfs` models files, directories, partitions and storage devices
//! inside a logical clock: operations cost simulated time computed from
//! device bandwidth and latency models, and never touch real hardware.
//! It is built for simulators that need physically plausible timing and
//! space accounting - partition capacity, RAID overhead, cache eviction -
//! without performing any I/O.
//!
//! ## Core components
//!
//! - [`SimWorld`]: the discrete-event engine - logical clock plus event
//!   queue. Same inputs, same timeline, every run.
//! - [`Storage`]: capability trait for devices serving timed transfers.
//!   [`OneDiskStorage`] wraps a single simulated [`Disk`];
//!   [`JbodStorage`] aggregates disks under a [`RaidLevel`] (0-6) with
//!   documented capacity and throughput formulas.
//! - [`FileSystem`]: a mount table mapping path prefixes to
//!   [`Partition`]s, dispatching create/open/move/unlink and friends.
//! - [`Partition`]: space accounting and a [`CachingScheme`]
//!   (`None`/`Fifo`/`Lru`) that evicts evictable files under pressure.
//! - [`File`]: an open handle with synchronous and asynchronous
//!   read/write, seek and stat. Async operations return [`IoActivity`]
//!   handles with a `Pending -> Completed | Cancelled` state machine.
//! - [`FileSystemRegistry`]: routing table from simulated network zones
//!   to the file systems visible in them.
//!
//! ## Quick start
//!
//! ```
//! use simfs::{CachingScheme, Disk, FileSystem, OneDiskStorage, SimWorld};
//!
//! let sim = SimWorld::new();
//! let disk = Disk::sata_ssd("disk0", 1_000_000_000);
//! let storage = OneDiskStorage::create(&sim, "local", disk);
//!
//! let fs = FileSystem::create(&sim, "my_fs", FileSystem::DEFAULT_MAX_OPEN_FILES);
//! fs.mount_partition("/data", storage, 1_000_000, CachingScheme::Lru)
//!     .unwrap();
//!
//! fs.create_file("/data/a.txt", 4096).unwrap();
//! assert_eq!(fs.file_size("/data/a.txt").unwrap(), 4096);
//! assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 1_000_000 - 4096);
//! ```
//!
//! Reads and writes are futures that resolve as the simulation is
//! stepped; drive them with any single-threaded executor while calling
//! [`SimWorld::step`] until the queue drains.

#![deny(missing_docs)]

pub mod error;
pub mod fs;
pub mod sim;
pub mod storage;

pub use error::{FsError, FsResult};
pub use fs::{
    AccessMode, CachingScheme, File, FileStat, FileSystem, FileSystemRegistry, Partition,
    SeekOrigin,
};
pub use sim::{Event, SimWorld, WeakSimWorld};
pub use storage::{
    Disk, IoActivity, IoFuture, IoOp, IoStatus, JbodStorage, OneDiskStorage, RaidLevel, Storage,
};
