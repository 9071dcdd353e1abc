//! Simulated storage devices.
//!
//! A [`Storage`] is a capability: something able to serve a timed read or
//! write of `n` bytes against the simulation clock. The two tagged
//! implementations are [`OneDiskStorage`] (a single simulated disk) and
//! [`JbodStorage`] (an array of disks aggregated under a RAID level).
//! Storages are shared by reference: one storage may back several
//! partitions.

pub mod disk;
pub(crate) mod io;
pub mod jbod;
pub mod one_disk;

pub use disk::Disk;
pub use io::{IoActivity, IoFuture, IoOp, IoStatus};
pub use jbod::{JbodStorage, RaidLevel};
pub use one_disk::OneDiskStorage;

use crate::error::FsResult;
use async_trait::async_trait;

/// Capability trait for simulated storage.
///
/// Single-threaded design - no Send bounds needed. Implementations
/// compute a completion time for each transfer from their device timing
/// model and hand back an [`IoActivity`] handle; they never move real
/// bytes.
#[async_trait(?Send)]
pub trait Storage {
    /// The storage's name.
    fn name(&self) -> &str;

    /// Effective capacity in bytes (after any RAID overhead).
    fn capacity(&self) -> u64;

    /// Number of underlying disks.
    fn num_disks(&self) -> usize;

    /// The RAID level this storage operates at.
    ///
    /// Level 0 is the answer for anything that does not stripe or
    /// mirror, including single-disk storage.
    fn raid_level(&self) -> RaidLevel;

    /// Begin a simulated transfer of `num_bytes`, starting now.
    ///
    /// Returns immediately with the in-flight activity; the transfer
    /// completes when the simulation clock reaches its completion time.
    fn serve(&self, op: IoOp, num_bytes: u64) -> FsResult<IoActivity>;

    /// Serve a read and suspend the calling actor until it completes.
    ///
    /// Returns the number of bytes read.
    async fn read(&self, num_bytes: u64) -> FsResult<u64> {
        self.serve(IoOp::Read, num_bytes)?.wait().await
    }

    /// Serve a write and suspend the calling actor until it completes.
    ///
    /// Returns the number of bytes written.
    async fn write(&self, num_bytes: u64) -> FsResult<u64> {
        self.serve(IoOp::Write, num_bytes)?.wait().await
    }
}
