//! Partitions: capacity accounting, file metadata and eviction.
//!
//! A partition is a named, sized region bound to one storage. It owns a
//! directory tree of file metadata and enforces the space invariant
//! `free_space == size - sum(charged bytes)` across creations, deletions,
//! truncations and in-flight writes. When a mutation does not fit, the
//! partition's caching scheme decides whether evictable files are removed
//! to make room.

use crate::error::{FsError, FsResult};
use crate::fs::caching::{select_victims, CachingScheme, EvictionCandidate};
use crate::fs::metadata::{FileMetadata, FileStat};
use crate::sim::WeakSimWorld;
use crate::storage::Storage;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

pub(crate) struct PartitionInner {
    name: String,
    sim: WeakSimWorld,
    storage: Rc<dyn Storage>,
    size: u64,
    free_space: u64,
    caching: CachingScheme,
    /// directory path -> file name -> metadata.
    content: HashMap<String, BTreeMap<String, FileMetadata>>,
    next_write_id: u64,
}

/// A named, sized region of a file system mounted on one storage.
///
/// Cheap to clone; clones share the same underlying state.
#[derive(Clone)]
pub struct Partition {
    inner: Rc<RefCell<PartitionInner>>,
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Partition")
            .field("name", &inner.name)
            .field("size", &inner.size)
            .field("free_space", &inner.free_space)
            .field("caching", &inner.caching)
            .finish()
    }
}

impl PartitionInner {
    fn now(&self) -> FsResult<Duration> {
        Ok(self.sim.upgrade()?.now())
    }

    fn meta(&self, dir_path: &str, file_name: &str) -> Option<&FileMetadata> {
        self.content.get(dir_path).and_then(|dir| dir.get(file_name))
    }

    fn meta_mut(&mut self, dir_path: &str, file_name: &str) -> Option<&mut FileMetadata> {
        self.content
            .get_mut(dir_path)
            .and_then(|dir| dir.get_mut(file_name))
    }

    fn require_meta_mut(
        &mut self,
        dir_path: &str,
        file_name: &str,
    ) -> FsResult<&mut FileMetadata> {
        if self.meta(dir_path, file_name).is_none() {
            return Err(FsError::NoSuchFile(join_path(dir_path, file_name)));
        }
        Ok(self
            .meta_mut(dir_path, file_name)
            .expect("checked just above"))
    }

    /// Make at least `needed` bytes available, evicting per the caching
    /// scheme if necessary. On failure nothing is changed.
    ///
    /// `exclude` shields one file (e.g. the one being grown) from
    /// eviction even when it would otherwise qualify.
    fn ensure_space(&mut self, needed: u64, exclude: Option<(&str, &str)>) -> FsResult<()> {
        if needed <= self.free_space {
            return Ok(());
        }
        let shortfall = needed - self.free_space;

        if self.caching == CachingScheme::None {
            return Err(FsError::InsufficientSpace {
                partition: self.name.clone(),
                needed,
                available: self.free_space,
            });
        }

        let candidates = self.eviction_candidates(exclude);
        let reclaimable: u64 = candidates.iter().map(|c| c.bytes).sum();
        let Some(victims) = select_victims(candidates, shortfall) else {
            return Err(FsError::InsufficientSpace {
                partition: self.name.clone(),
                needed,
                available: self.free_space + reclaimable,
            });
        };

        for victim in victims {
            tracing::debug!(
                partition = %self.name,
                path = %join_path(&victim.dir_path, &victim.file_name),
                bytes = victim.bytes,
                "evicting file"
            );
            if let Some(dir) = self.content.get_mut(&victim.dir_path) {
                dir.remove(&victim.file_name);
            }
            self.free_space += victim.bytes;
        }
        Ok(())
    }

    /// Files the eviction policy may remove: evictable, not open, and
    /// with no write in flight.
    fn eviction_candidates(&self, exclude: Option<(&str, &str)>) -> Vec<EvictionCandidate> {
        let mut candidates = Vec::new();
        for (dir_path, files) in &self.content {
            for (file_name, meta) in files {
                if !meta.evictable || meta.refcount > 0 || !meta.ongoing_writes.is_empty() {
                    continue;
                }
                if exclude == Some((dir_path.as_str(), file_name.as_str())) {
                    continue;
                }
                let stamp = match self.caching {
                    CachingScheme::Fifo => meta.creation_date,
                    CachingScheme::Lru => meta.access_date,
                    CachingScheme::None => continue,
                };
                candidates.push(EvictionCandidate {
                    dir_path: dir_path.clone(),
                    file_name: file_name.clone(),
                    bytes: meta.charged(),
                    stamp,
                });
            }
        }
        candidates
    }
}

impl Partition {
    pub(crate) fn new(
        sim: WeakSimWorld,
        name: &str,
        storage: Rc<dyn Storage>,
        size: u64,
        caching: CachingScheme,
    ) -> Self {
        if size > storage.capacity() {
            tracing::warn!(
                partition = %name,
                partition_size = size,
                storage_capacity = storage.capacity(),
                "partition is larger than its storage's effective capacity"
            );
        }
        Self {
            inner: Rc::new(RefCell::new(PartitionInner {
                name: name.to_string(),
                sim,
                storage,
                size,
                free_space: size,
                caching,
                content: HashMap::new(),
                next_write_id: 0,
            })),
        }
    }

    /// The partition's name (its mount point within the file system).
    pub fn get_name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Total size in bytes.
    pub fn get_size(&self) -> u64 {
        self.inner.borrow().size
    }

    /// Currently free bytes.
    pub fn get_free_space(&self) -> u64 {
        self.inner.borrow().free_space
    }

    /// Number of files resident on the partition.
    pub fn get_num_files(&self) -> usize {
        self.inner.borrow().content.values().map(BTreeMap::len).sum()
    }

    /// The caching scheme chosen at mount time.
    pub fn caching_scheme(&self) -> CachingScheme {
        self.inner.borrow().caching
    }

    /// The storage serving this partition's transfers.
    pub fn get_storage(&self) -> Rc<dyn Storage> {
        self.inner.borrow().storage.clone()
    }

    pub(crate) fn current_time(&self) -> FsResult<Duration> {
        self.inner.borrow().now()
    }

    pub(crate) fn same_partition(&self, other: &Partition) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a file of the given size, evicting per the caching scheme
    /// when free space does not suffice.
    pub(crate) fn create_file(&self, dir_path: &str, file_name: &str, size: u64) -> FsResult<()> {
        let mut inner = self.inner.borrow_mut();
        let now = inner.now()?;

        if file_name.is_empty() {
            return Err(FsError::InvalidPath(join_path(dir_path, file_name)));
        }
        if inner.meta(dir_path, file_name).is_some() {
            return Err(FsError::FileAlreadyExists(join_path(dir_path, file_name)));
        }

        inner.ensure_space(size, None)?;
        inner.free_space -= size;
        inner
            .content
            .entry(dir_path.to_string())
            .or_default()
            .insert(file_name.to_string(), FileMetadata::new(size, now));

        tracing::debug!(
            partition = %inner.name,
            path = %join_path(dir_path, file_name),
            size,
            "file created"
        );
        Ok(())
    }

    pub(crate) fn file_exists(&self, dir_path: &str, file_name: &str) -> bool {
        self.inner.borrow().meta(dir_path, file_name).is_some()
    }

    pub(crate) fn file_size(&self, dir_path: &str, file_name: &str) -> FsResult<u64> {
        self.inner
            .borrow()
            .meta(dir_path, file_name)
            .map(|m| m.current_size)
            .ok_or_else(|| FsError::NoSuchFile(join_path(dir_path, file_name)))
    }

    pub(crate) fn stat(&self, dir_path: &str, file_name: &str) -> FsResult<FileStat> {
        self.inner
            .borrow()
            .meta(dir_path, file_name)
            .map(FileMetadata::stat)
            .ok_or_else(|| FsError::NoSuchFile(join_path(dir_path, file_name)))
    }

    /// Remove a file and reclaim its bytes. Open files cannot be removed.
    pub(crate) fn unlink_file(&self, dir_path: &str, file_name: &str) -> FsResult<()> {
        let mut inner = self.inner.borrow_mut();

        let charged = {
            let meta = inner
                .meta(dir_path, file_name)
                .ok_or_else(|| FsError::NoSuchFile(join_path(dir_path, file_name)))?;
            if meta.refcount > 0 {
                return Err(FsError::FileIsOpen(join_path(dir_path, file_name)));
            }
            meta.charged()
        };

        if let Some(dir) = inner.content.get_mut(dir_path) {
            dir.remove(file_name);
        }
        inner.free_space += charged;
        Ok(())
    }

    /// Flag or unflag a file as an eviction candidate.
    pub(crate) fn make_file_evictable(
        &self,
        dir_path: &str,
        file_name: &str,
        evictable: bool,
    ) -> FsResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.require_meta_mut(dir_path, file_name)?.evictable = evictable;
        Ok(())
    }

    /// Rename a file within this partition, keeping its metadata.
    ///
    /// Overwriting an existing destination must be requested explicitly;
    /// the destination's bytes are then reclaimed. Open files can be
    /// neither moved nor overwritten.
    pub(crate) fn move_entry(
        &self,
        src_dir: &str,
        src_name: &str,
        dst_dir: &str,
        dst_name: &str,
        overwrite: bool,
    ) -> FsResult<()> {
        let mut inner = self.inner.borrow_mut();

        {
            let src = inner
                .meta(src_dir, src_name)
                .ok_or_else(|| FsError::NoSuchFile(join_path(src_dir, src_name)))?;
            if src.refcount > 0 {
                return Err(FsError::FileIsOpen(join_path(src_dir, src_name)));
            }
        }

        // mv of a file onto itself, just like in the real world
        if src_dir == dst_dir && src_name == dst_name {
            return Ok(());
        }

        if let Some(dst) = inner.meta(dst_dir, dst_name) {
            if !overwrite {
                return Err(FsError::DestinationExists(join_path(dst_dir, dst_name)));
            }
            if dst.refcount > 0 {
                return Err(FsError::FileIsOpen(join_path(dst_dir, dst_name)));
            }
            let reclaimed = dst.charged();
            inner
                .content
                .get_mut(dst_dir)
                .expect("destination directory exists")
                .remove(dst_name);
            inner.free_space += reclaimed;
        }

        let meta = inner
            .content
            .get_mut(src_dir)
            .expect("source directory exists")
            .remove(src_name)
            .expect("source file exists");
        inner
            .content
            .entry(dst_dir.to_string())
            .or_default()
            .insert(dst_name.to_string(), meta);
        Ok(())
    }

    /// Resize a file. Growth re-runs the space/eviction check for the
    /// delta only; shrinking reclaims the difference.
    pub(crate) fn truncate_file(
        &self,
        dir_path: &str,
        file_name: &str,
        new_size: u64,
    ) -> FsResult<()> {
        let mut inner = self.inner.borrow_mut();
        let now = inner.now()?;

        let (old_charged, new_charged) = {
            let meta = inner
                .meta(dir_path, file_name)
                .ok_or_else(|| FsError::NoSuchFile(join_path(dir_path, file_name)))?;
            let old = meta.charged();
            let pending_max = meta.ongoing_writes.values().copied().max().unwrap_or(0);
            (old, new_size.max(pending_max))
        };

        if new_charged > old_charged {
            inner.ensure_space(new_charged - old_charged, Some((dir_path, file_name)))?;
            inner.free_space -= new_charged - old_charged;
        } else {
            inner.free_space += old_charged - new_charged;
        }

        let meta = inner.require_meta_mut(dir_path, file_name)?;
        meta.current_size = new_size;
        meta.modification_date = now;
        Ok(())
    }

    /// Directory bookkeeping. A directory exists once created explicitly
    /// or once a file has been created inside it.
    pub(crate) fn create_directory(&self, dir_path: &str) -> FsResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.content.contains_key(dir_path) {
            return Err(FsError::DirectoryAlreadyExists(dir_path.to_string()));
        }
        inner.content.insert(dir_path.to_string(), BTreeMap::new());
        Ok(())
    }

    pub(crate) fn directory_exists(&self, dir_path: &str) -> bool {
        self.inner.borrow().content.contains_key(dir_path)
    }

    pub(crate) fn list_files_in_directory(&self, dir_path: &str) -> FsResult<BTreeSet<String>> {
        self.inner
            .borrow()
            .content
            .get(dir_path)
            .map(|dir| dir.keys().cloned().collect())
            .ok_or_else(|| FsError::NoSuchDirectory(dir_path.to_string()))
    }

    /// Remove an empty directory.
    pub(crate) fn unlink_directory(&self, dir_path: &str) -> FsResult<()> {
        let mut inner = self.inner.borrow_mut();
        let dir = inner
            .content
            .get(dir_path)
            .ok_or_else(|| FsError::NoSuchDirectory(dir_path.to_string()))?;
        if !dir.is_empty() {
            return Err(FsError::DirectoryNotEmpty(dir_path.to_string()));
        }
        inner.content.remove(dir_path);
        Ok(())
    }

    // Open-handle bookkeeping, called by FileSystem/File.

    pub(crate) fn open_file(&self, dir_path: &str, file_name: &str) -> FsResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.require_meta_mut(dir_path, file_name)?.refcount += 1;
        Ok(())
    }

    pub(crate) fn release_file(&self, dir_path: &str, file_name: &str) {
        let mut inner = self.inner.borrow_mut();
        if let Some(meta) = inner.meta_mut(dir_path, file_name) {
            meta.refcount = meta.refcount.saturating_sub(1);
        }
    }

    /// Refresh a file's access date (reads and writes both count).
    pub(crate) fn touch_access(&self, dir_path: &str, file_name: &str, at: Duration) {
        let mut inner = self.inner.borrow_mut();
        if let Some(meta) = inner.meta_mut(dir_path, file_name) {
            meta.access_date = at;
        }
    }

    /// Reserve space for a write ending at byte offset `end`.
    ///
    /// Only the growth beyond the file's currently charged bytes is
    /// reserved; the eviction policy runs if that growth does not fit.
    /// Returns the write id to pass to [`Partition::finish_write`] or
    /// [`Partition::cancel_write`].
    pub(crate) fn begin_write(&self, dir_path: &str, file_name: &str, end: u64) -> FsResult<u64> {
        let mut inner = self.inner.borrow_mut();

        let old_charged = inner
            .meta(dir_path, file_name)
            .ok_or_else(|| FsError::NoSuchFile(join_path(dir_path, file_name)))?
            .charged();
        let growth = end.saturating_sub(old_charged);
        if growth > 0 {
            inner.ensure_space(growth, Some((dir_path, file_name)))?;
            inner.free_space -= growth;
        }

        let write_id = inner.next_write_id;
        inner.next_write_id += 1;
        inner
            .require_meta_mut(dir_path, file_name)?
            .ongoing_writes
            .insert(write_id, end);
        Ok(write_id)
    }

    /// Commit a completed write as of its simulated completion time.
    pub(crate) fn finish_write(
        &self,
        dir_path: &str,
        file_name: &str,
        write_id: u64,
        at: Duration,
    ) {
        self.settle_write(dir_path, file_name, write_id, None, at);
    }

    /// Commit a cancelled write: only the transferred prefix (ending at
    /// `achieved_end`) persists, and the unused reservation is released.
    pub(crate) fn cancel_write(
        &self,
        dir_path: &str,
        file_name: &str,
        write_id: u64,
        achieved_end: u64,
        at: Duration,
    ) {
        self.settle_write(dir_path, file_name, write_id, Some(achieved_end), at);
    }

    fn settle_write(
        &self,
        dir_path: &str,
        file_name: &str,
        write_id: u64,
        achieved_end: Option<u64>,
        at: Duration,
    ) {
        let mut inner = self.inner.borrow_mut();
        let Some(meta) = inner.meta_mut(dir_path, file_name) else {
            return;
        };

        let old_charged = meta.charged();
        let Some(reserved_end) = meta.ongoing_writes.remove(&write_id) else {
            return;
        };
        let end = achieved_end.unwrap_or(reserved_end);
        meta.current_size = meta.current_size.max(end);
        meta.modification_date = at;
        meta.access_date = at;
        let new_charged = meta.charged();

        // Reservations only ever shrink when a write settles.
        inner.free_space += old_charged - new_charged;
    }
}

/// Join a partition-relative directory path and file name for display.
pub(crate) fn join_path(dir_path: &str, file_name: &str) -> String {
    if dir_path == "/" {
        format!("/{file_name}")
    } else {
        format!("{dir_path}/{file_name}")
    }
}
