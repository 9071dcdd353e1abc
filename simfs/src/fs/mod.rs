//! The file-system layer: mount tables, partitions, files and eviction.
//!
//! ## Submodules
//!
//! - `file_system` - mount table and operation dispatch
//! - `partition` - capacity accounting and eviction enforcement
//! - `file` - open handles, sync and async I/O
//! - `caching` - eviction schemes and victim selection
//! - `metadata` - per-file records and stat snapshots
//! - `path` - path simplification and mount-point matching
//! - `registry` - zone-to-file-system routing

pub mod caching;
pub mod file;
pub mod file_system;
pub(crate) mod metadata;
pub mod partition;
pub mod path;
pub mod registry;

pub use caching::CachingScheme;
pub use file::{AccessMode, File, SeekOrigin};
pub use file_system::FileSystem;
pub use metadata::FileStat;
pub use partition::Partition;
pub use registry::FileSystemRegistry;
