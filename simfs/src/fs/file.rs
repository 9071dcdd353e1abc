//! Open file handles.
//!
//! A [`File`] is an open handle into a path resolved by the file system:
//! it carries the byte offset, the access mode and the bookkeeping for
//! asynchronous transfers issued through it. Multiple handles may be open
//! on the same path.
//!
//! Synchronous [`File::read`]/[`File::write`] suspend the calling
//! simulated actor until the transfer's simulated completion time; the
//! `_async` variants return an [`IoActivity`] handle immediately and the
//! actor settles it later. Partition-visible effects (sizes, dates) are
//! committed as of the transfer's simulated completion time.

use crate::error::{FsError, FsResult};
use crate::fs::file_system::FileSystem;
use crate::fs::metadata::FileStat;
use crate::fs::partition::Partition;
use crate::storage::{IoActivity, IoOp, Storage};
use std::fmt;

/// How a file was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `"r"`: reading only.
    Read,
    /// `"w"`: writing at the current offset.
    Write,
    /// `"a"`: writing, with every write positioned at end-of-file.
    Append,
}

impl AccessMode {
    /// Parse a mode string (`"r"`, `"w"` or `"a"`).
    pub fn parse(mode: &str) -> FsResult<Self> {
        match mode {
            "r" => Ok(AccessMode::Read),
            "w" => Ok(AccessMode::Write),
            "a" => Ok(AccessMode::Append),
            other => Err(FsError::InvalidAccessMode(other.to_string())),
        }
    }

    /// The mode string this was parsed from.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
            AccessMode::Append => "a",
        }
    }
}

/// Origin for [`File::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// From the start of the file.
    Set,
    /// From the current offset.
    Current,
    /// From the end of the file.
    End,
}

/// An asynchronous operation issued through this handle and not yet
/// settled against the partition.
struct PendingOp {
    activity: IoActivity,
    /// Present for writes: the reservation to commit or roll back.
    write: Option<PendingWrite>,
}

struct PendingWrite {
    write_id: u64,
    start: u64,
}

/// An open handle on a simulated file.
pub struct File {
    fs: FileSystem,
    partition: Partition,
    dir_path: String,
    file_name: String,
    full_path: String,
    mode: AccessMode,
    position: u64,
    pending: Vec<PendingOp>,
    released: bool,
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.full_path)
            .field("mode", &self.mode)
            .field("position", &self.position)
            .field("pending_ops", &self.pending.len())
            .finish()
    }
}

impl File {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        fs: FileSystem,
        partition: Partition,
        dir_path: String,
        file_name: String,
        full_path: String,
        mode: AccessMode,
        position: u64,
    ) -> Self {
        Self {
            fs,
            partition,
            dir_path,
            file_name,
            full_path,
            mode,
            position,
            pending: Vec::new(),
            released: false,
        }
    }

    /// The full (simplified) path this handle was opened on.
    pub fn get_path(&self) -> &str {
        &self.full_path
    }

    /// The access mode this handle was opened with.
    pub fn get_access_mode(&self) -> AccessMode {
        self.mode
    }

    /// The current byte offset.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// The file's current size in bytes.
    pub fn size(&self) -> FsResult<u64> {
        self.partition.file_size(&self.dir_path, &self.file_name)
    }

    /// A snapshot of the file's metadata.
    pub fn stat(&self) -> FsResult<FileStat> {
        self.partition.stat(&self.dir_path, &self.file_name)
    }

    /// Set the offset relative to the given origin.
    ///
    /// Seeking before byte 0 fails with [`FsError::InvalidSeek`]; seeking
    /// past end-of-file is allowed and subsequent reads return 0 bytes.
    pub fn seek(&mut self, pos: i64, origin: SeekOrigin) -> FsResult<u64> {
        let base = match origin {
            SeekOrigin::Set => 0,
            SeekOrigin::Current => self.position,
            SeekOrigin::End => self.size()?,
        };
        let target = base as i128 + pos as i128;
        if target < 0 {
            return Err(FsError::InvalidSeek(pos));
        }
        self.position = target as u64;
        Ok(self.position)
    }

    /// Read up to `num_bytes`, suspending the calling actor until the
    /// simulated transfer completes.
    ///
    /// Short reads happen at end-of-file; reading at or past it returns
    /// 0 bytes without error and without touching the storage.
    pub async fn read(&mut self, num_bytes: u64) -> FsResult<u64> {
        let num_to_read = self.readable_bytes(num_bytes)?;
        if num_to_read == 0 {
            return Ok(0);
        }

        let activity = self
            .partition
            .get_storage()
            .serve(IoOp::Read, num_to_read)?;
        let bytes = activity.wait().await?;
        self.position += bytes;
        self.partition
            .touch_access(&self.dir_path, &self.file_name, activity.completion_time());
        Ok(bytes)
    }

    /// Start an asynchronous read and return its handle immediately.
    ///
    /// The offset advances right away, as if the read will complete; the
    /// access date is refreshed when the handle is settled.
    pub fn read_async(&mut self, num_bytes: u64) -> FsResult<IoActivity> {
        let num_to_read = self.readable_bytes(num_bytes)?;
        let activity = self
            .partition
            .get_storage()
            .serve(IoOp::Read, num_to_read)?;
        self.position += num_to_read;
        self.pending.push(PendingOp {
            activity: activity.clone(),
            write: None,
        });
        Ok(activity)
    }

    /// Write `num_bytes` at the current offset, suspending the calling
    /// actor until the simulated transfer completes.
    ///
    /// Growth beyond the file's charged bytes is reserved up front
    /// (running the eviction policy if needed, and failing with
    /// [`FsError::InsufficientSpace`] before any transfer is simulated);
    /// the visible size and dates commit at the completion time.
    pub async fn write(&mut self, num_bytes: u64) -> FsResult<u64> {
        if self.mode == AccessMode::Read {
            return Err(FsError::InvalidAccessMode(self.mode.as_str().to_string()));
        }
        if num_bytes == 0 {
            return Ok(0);
        }
        let (end, write_id) = self.start_write(num_bytes)?;

        let activity = self.partition.get_storage().serve(IoOp::Write, num_bytes)?;
        let bytes = activity.wait().await?;
        self.partition.finish_write(
            &self.dir_path,
            &self.file_name,
            write_id,
            activity.completion_time(),
        );
        self.position = end;
        Ok(bytes)
    }

    /// Start an asynchronous write and return its handle immediately.
    ///
    /// The reservation is taken up front and the offset advances right
    /// away; the visible size commits when the handle is settled.
    pub fn write_async(&mut self, num_bytes: u64) -> FsResult<IoActivity> {
        let start = self.write_start_offset()?;
        let (end, write_id) = self.start_write(num_bytes)?;
        let activity = self.partition.get_storage().serve(IoOp::Write, num_bytes)?;
        self.position = end;
        self.pending.push(PendingOp {
            activity: activity.clone(),
            write: Some(PendingWrite { write_id, start }),
        });
        Ok(activity)
    }

    /// Await an asynchronous operation issued through this handle and
    /// apply its completion bookkeeping. Returns the final byte count.
    pub async fn wait(&mut self, activity: &IoActivity) -> FsResult<u64> {
        let bytes = activity.wait().await?;
        self.settle(activity, bytes)?;
        Ok(bytes)
    }

    /// Cancel an asynchronous operation issued through this handle.
    ///
    /// Accounting stops at the current simulated time; for writes, only
    /// the transferred prefix is committed and the unused reservation is
    /// released. Returns the bytes transferred so far.
    pub fn cancel(&mut self, activity: &IoActivity) -> FsResult<u64> {
        let bytes = activity.cancel()?;
        self.settle(activity, bytes)?;
        Ok(bytes)
    }

    /// Bytes actually moved so far by a read activity.
    pub fn get_num_bytes_read(&self, read: &IoActivity) -> FsResult<u64> {
        read.transferred_now()
    }

    /// Bytes actually moved so far by a write activity.
    pub fn get_num_bytes_written(&self, write: &IoActivity) -> FsResult<u64> {
        write.transferred_now()
    }

    /// Write `num_bytes` at end-of-file.
    pub async fn append(&mut self, num_bytes: u64) -> FsResult<u64> {
        self.position = self.size()?;
        self.write(num_bytes).await
    }

    /// Resize the file. Requires a writable handle.
    pub fn truncate(&mut self, new_size: u64) -> FsResult<()> {
        if self.mode == AccessMode::Read {
            return Err(FsError::InvalidAccessMode(self.mode.as_str().to_string()));
        }
        self.partition
            .truncate_file(&self.dir_path, &self.file_name, new_size)
    }

    /// Close the handle.
    ///
    /// Outstanding asynchronous operations are cancelled (their partial
    /// byte counts remain queryable on the activity handles) so nothing
    /// stays queued in the simulation on the file's behalf.
    pub fn close(mut self) -> FsResult<()> {
        self.release();
        Ok(())
    }

    fn readable_bytes(&self, num_bytes: u64) -> FsResult<u64> {
        if self.mode != AccessMode::Read {
            return Err(FsError::InvalidAccessMode(self.mode.as_str().to_string()));
        }
        let size = self.size()?;
        Ok(num_bytes.min(size.saturating_sub(self.position)))
    }

    fn write_start_offset(&self) -> FsResult<u64> {
        match self.mode {
            AccessMode::Append => self.size(),
            _ => Ok(self.position),
        }
    }

    /// Reserve space for a write of `num_bytes` at the effective offset.
    fn start_write(&mut self, num_bytes: u64) -> FsResult<(u64, u64)> {
        if self.mode == AccessMode::Read {
            return Err(FsError::InvalidAccessMode(self.mode.as_str().to_string()));
        }
        if self.mode == AccessMode::Append {
            self.position = self.size()?;
        }
        let end = self.position + num_bytes;
        let write_id = self
            .partition
            .begin_write(&self.dir_path, &self.file_name, end)?;
        Ok((end, write_id))
    }

    /// Apply completion or cancellation bookkeeping for one pending op.
    fn settle(&mut self, activity: &IoActivity, bytes: u64) -> FsResult<()> {
        let Some(idx) = self
            .pending
            .iter()
            .position(|op| op.activity.id() == activity.id())
        else {
            return Ok(());
        };
        let op = self.pending.swap_remove(idx);

        match op.write {
            Some(write) => {
                if activity.is_cancelled() {
                    let at = self.partition.current_time()?;
                    self.partition.cancel_write(
                        &self.dir_path,
                        &self.file_name,
                        write.write_id,
                        write.start + bytes,
                        at,
                    );
                } else {
                    self.partition.finish_write(
                        &self.dir_path,
                        &self.file_name,
                        write.write_id,
                        activity.completion_time(),
                    );
                }
            }
            None => {
                if activity.is_completed() {
                    self.partition.touch_access(
                        &self.dir_path,
                        &self.file_name,
                        activity.completion_time(),
                    );
                }
            }
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let pending = std::mem::take(&mut self.pending);
        for op in pending {
            if op.activity.is_pending() {
                // Ignore shutdown errors: a dead world has no accounting
                // left to keep consistent.
                let _ = op.activity.cancel();
            }
            let bytes = op.activity.transferred_now().unwrap_or(0);
            match op.write {
                Some(write) => {
                    if op.activity.is_cancelled() {
                        if let Ok(at) = self.partition.current_time() {
                            self.partition.cancel_write(
                                &self.dir_path,
                                &self.file_name,
                                write.write_id,
                                write.start + bytes,
                                at,
                            );
                        }
                    } else {
                        self.partition.finish_write(
                            &self.dir_path,
                            &self.file_name,
                            write.write_id,
                            op.activity.completion_time(),
                        );
                    }
                }
                None => {
                    if op.activity.is_completed() {
                        self.partition.touch_access(
                            &self.dir_path,
                            &self.file_name,
                            op.activity.completion_time(),
                        );
                    }
                }
            }
        }

        self.partition.release_file(&self.dir_path, &self.file_name);
        self.fs.release_handle();
    }
}

impl Drop for File {
    fn drop(&mut self) {
        self.release();
    }
}
