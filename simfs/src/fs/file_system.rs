//! The file-system abstraction: a mount table and the operations
//! dispatched through it.
//!
//! A `FileSystem` owns a set of partitions keyed by mount point and
//! resolves every path to the partition whose mount point is the longest
//! component-boundary prefix. It also bounds the number of simultaneously
//! open file handles.

use crate::error::{FsError, FsResult};
use crate::fs::caching::CachingScheme;
use crate::fs::file::{AccessMode, File};
use crate::fs::partition::Partition;
use crate::fs::path;
use crate::sim::SimWorld;
use crate::sim::WeakSimWorld;
use crate::storage::Storage;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

struct FileSystemInner {
    name: String,
    sim: WeakSimWorld,
    max_open_files: usize,
    num_open_files: usize,
    /// normalized mount point -> partition.
    partitions: BTreeMap<String, Partition>,
}

/// A simulated file system: a mount table over storages.
///
/// Cheap to clone; clones share the same underlying state.
#[derive(Clone)]
pub struct FileSystem {
    inner: Rc<RefCell<FileSystemInner>>,
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FileSystem")
            .field("name", &inner.name)
            .field("num_open_files", &inner.num_open_files)
            .field("mounts", &inner.partitions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FileSystem {
    /// Default bound on simultaneously open file handles.
    pub const DEFAULT_MAX_OPEN_FILES: usize = 1024;

    /// Create a file system with an empty mount table.
    pub fn create(sim: &SimWorld, name: &str, max_open_files: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FileSystemInner {
                name: name.to_string(),
                sim: sim.downgrade(),
                max_open_files,
                num_open_files: 0,
                partitions: BTreeMap::new(),
            })),
        }
    }

    /// The file system's name.
    pub fn get_name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Number of file handles currently open.
    pub fn num_open_files(&self) -> usize {
        self.inner.borrow().num_open_files
    }

    /// Register a new partition of `size` bytes at `mount_point`.
    ///
    /// The mount point is normalized first and becomes the partition's
    /// name. Fails with [`FsError::MountConflict`] if it equals, sits
    /// under, or covers an existing mount point.
    pub fn mount_partition(
        &self,
        mount_point: &str,
        storage: Rc<dyn Storage>,
        size: u64,
        caching_scheme: CachingScheme,
    ) -> FsResult<Partition> {
        let normalized = path::simplify_path_string(mount_point)?;
        let mut inner = self.inner.borrow_mut();

        for existing in inner.partitions.keys() {
            if path::is_at_mount_point(&normalized, existing)
                || path::is_at_mount_point(existing, &normalized)
            {
                return Err(FsError::MountConflict(normalized, existing.clone()));
            }
        }

        tracing::debug!(
            fs = %inner.name,
            mount_point = %normalized,
            size,
            ?caching_scheme,
            storage = storage.name(),
            "partition mounted"
        );
        let partition = Partition::new(
            inner.sim.clone(),
            &normalized,
            storage,
            size,
            caching_scheme,
        );
        inner.partitions.insert(normalized, partition.clone());
        Ok(partition)
    }

    /// Resolve a path to its partition and partition-relative remainder.
    fn resolve(&self, full_path: &str) -> FsResult<(Partition, String)> {
        let simplified = path::simplify_path_string(full_path)?;
        let inner = self.inner.borrow();

        let best = inner
            .partitions
            .iter()
            .filter(|(mount_point, _)| path::is_at_mount_point(&simplified, mount_point))
            .max_by_key(|(mount_point, _)| mount_point.len());

        let (mount_point, partition) = match best {
            Some(found) => found,
            None => return Err(FsError::NoSuchPartition(simplified)),
        };
        let rel = path::path_at_mount_point(&simplified, mount_point)?;
        Ok((partition.clone(), rel))
    }

    /// Resolve a path naming a file into (partition, dir, file name).
    fn resolve_file(&self, full_path: &str) -> FsResult<(Partition, String, String)> {
        let (partition, rel) = self.resolve(full_path)?;
        let (dir_path, file_name) = path::split_path(&rel);
        if file_name.is_empty() {
            return Err(FsError::InvalidPath(full_path.to_string()));
        }
        Ok((partition, dir_path, file_name))
    }

    /// Create a file of the given size.
    pub fn create_file(&self, full_path: &str, size: u64) -> FsResult<()> {
        let (partition, dir_path, file_name) = self.resolve_file(full_path)?;
        partition.create_file(&dir_path, &file_name, size)
    }

    /// Create a directory.
    pub fn create_directory(&self, full_dir_path: &str) -> FsResult<()> {
        let (partition, rel) = self.resolve(full_dir_path)?;
        partition.create_directory(&rel)
    }

    /// Whether a file exists at the path.
    pub fn file_exists(&self, full_path: &str) -> FsResult<bool> {
        let (partition, dir_path, file_name) = self.resolve_file(full_path)?;
        Ok(partition.file_exists(&dir_path, &file_name))
    }

    /// Whether a directory exists at the path.
    pub fn directory_exists(&self, full_dir_path: &str) -> FsResult<bool> {
        let (partition, rel) = self.resolve(full_dir_path)?;
        Ok(partition.directory_exists(&rel))
    }

    /// The names of the files directly inside a directory.
    pub fn list_files_in_directory(&self, full_dir_path: &str) -> FsResult<BTreeSet<String>> {
        let (partition, rel) = self.resolve(full_dir_path)?;
        partition.list_files_in_directory(&rel)
    }

    /// Remove a file. Open files cannot be removed.
    pub fn unlink_file(&self, full_path: &str) -> FsResult<()> {
        let (partition, dir_path, file_name) = self.resolve_file(full_path)?;
        partition.unlink_file(&dir_path, &file_name)
    }

    /// Remove an empty directory.
    pub fn unlink_directory(&self, full_dir_path: &str) -> FsResult<()> {
        let (partition, rel) = self.resolve(full_dir_path)?;
        partition.unlink_directory(&rel)
    }

    /// Move (rename) a file within its partition.
    ///
    /// Cross-partition moves are rejected with [`FsError::InvalidMove`].
    /// `overwrite` decides what happens when the destination exists:
    /// without it the move fails with [`FsError::DestinationExists`].
    pub fn move_file(
        &self,
        src_full_path: &str,
        dst_full_path: &str,
        overwrite: bool,
    ) -> FsResult<()> {
        let (src_partition, src_dir, src_name) = self.resolve_file(src_full_path)?;
        let (dst_partition, dst_dir, dst_name) = self.resolve_file(dst_full_path)?;

        if !src_partition.same_partition(&dst_partition) {
            return Err(FsError::InvalidMove(
                src_full_path.to_string(),
                dst_full_path.to_string(),
            ));
        }
        src_partition.move_entry(&src_dir, &src_name, &dst_dir, &dst_name, overwrite)
    }

    /// Resize a file; growth re-runs the space/eviction check for the
    /// delta only.
    pub fn truncate_file(&self, full_path: &str, new_size: u64) -> FsResult<()> {
        let (partition, dir_path, file_name) = self.resolve_file(full_path)?;
        partition.truncate_file(&dir_path, &file_name, new_size)
    }

    /// The file's size in bytes.
    pub fn file_size(&self, full_path: &str) -> FsResult<u64> {
        let (partition, dir_path, file_name) = self.resolve_file(full_path)?;
        partition.file_size(&dir_path, &file_name)
    }

    /// Free space on the partition holding the path.
    pub fn get_free_space_at_path(&self, full_path: &str) -> FsResult<u64> {
        let (partition, _) = self.resolve(full_path)?;
        Ok(partition.get_free_space())
    }

    /// Toggle a resident file's eviction eligibility.
    ///
    /// Files that are not evictable are never chosen as eviction victims,
    /// even under pressure.
    pub fn make_file_evictable(&self, full_path: &str, evictable: bool) -> FsResult<()> {
        let (partition, dir_path, file_name) = self.resolve_file(full_path)?;
        partition.make_file_evictable(&dir_path, &file_name, evictable)
    }

    /// Open a file, returning a handle.
    ///
    /// Mode `"r"` requires the file to exist; `"w"` and `"a"` create an
    /// empty file on demand. `"a"` positions the handle at end-of-file.
    /// Fails with [`FsError::TooManyOpenFiles`] when the handle limit is
    /// reached.
    pub fn open(&self, full_path: &str, mode: &str) -> FsResult<File> {
        let access_mode = AccessMode::parse(mode)?;
        let simplified = path::simplify_path_string(full_path)?;
        let (partition, dir_path, file_name) = self.resolve_file(&simplified)?;

        if !partition.file_exists(&dir_path, &file_name) {
            match access_mode {
                AccessMode::Read => return Err(FsError::NoSuchFile(simplified)),
                AccessMode::Write | AccessMode::Append => {
                    partition.create_file(&dir_path, &file_name, 0)?;
                }
            }
        }

        {
            let mut inner = self.inner.borrow_mut();
            if inner.num_open_files >= inner.max_open_files {
                return Err(FsError::TooManyOpenFiles(inner.max_open_files));
            }
            inner.num_open_files += 1;
        }
        partition.open_file(&dir_path, &file_name)?;

        let position = match access_mode {
            AccessMode::Append => partition.file_size(&dir_path, &file_name)?,
            _ => 0,
        };

        tracing::trace!(path = %simplified, mode, "file opened");
        Ok(File::new(
            self.clone(),
            partition,
            dir_path,
            file_name,
            simplified,
            access_mode,
            position,
        ))
    }

    /// The partition holding the path, or `None`.
    pub fn get_partition_for_path_or_null(&self, full_path: &str) -> Option<Partition> {
        self.resolve(full_path).ok().map(|(partition, _)| partition)
    }

    /// Look up a partition by name (its mount point).
    pub fn partition_by_name(&self, name: &str) -> FsResult<Partition> {
        self.partition_by_name_or_null(name)
            .ok_or_else(|| FsError::NoSuchPartition(name.to_string()))
    }

    /// Look up a partition by name, or `None`.
    pub fn partition_by_name_or_null(&self, name: &str) -> Option<Partition> {
        let normalized = path::simplify_path_string(name).ok()?;
        self.inner.borrow().partitions.get(&normalized).cloned()
    }

    /// All mounted partitions, in mount-point order.
    pub fn get_partitions(&self) -> Vec<Partition> {
        self.inner.borrow().partitions.values().cloned().collect()
    }

    pub(crate) fn release_handle(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.num_open_files = inner.num_open_files.saturating_sub(1);
    }
}
