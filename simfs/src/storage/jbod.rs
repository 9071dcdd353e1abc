//! JBOD storage: an array of disks aggregated under a RAID level.
//!
//! Only capacity and throughput are modeled. The cost formulas are
//! deliberately simple and documented so results stay testable:
//!
//! - Reads stripe over the data disks; parity is not consulted on the
//!   healthy path. RAID1 reads are served in full by the fastest mirror.
//! - Writes stripe over every disk, parity included, so a level with
//!   `p` parity disks amplifies writes by `d / (d - p)`.
//! - Completion time of a striped transfer is the slowest disk's share.

use crate::error::{FsError, FsResult};
use crate::sim::{SimWorld, WeakSimWorld};
use crate::storage::disk::Disk;
use crate::storage::io::{IoActivity, IoOp};
use crate::storage::Storage;
use async_trait::async_trait;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// The RAID levels a [`JbodStorage`] can operate at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaidLevel {
    /// Striping, no redundancy.
    Raid0,
    /// Full mirroring.
    Raid1,
    /// Bit-level striping with dedicated parity.
    Raid2,
    /// Byte-level striping with one parity disk.
    Raid3,
    /// Block-level striping with a dedicated parity disk.
    Raid4,
    /// Block-level striping with rotating parity.
    Raid5,
    /// Block-level striping with double rotating parity.
    Raid6,
}

impl RaidLevel {
    /// Minimum number of disks the level can operate on.
    pub fn min_disks(self) -> usize {
        match self {
            RaidLevel::Raid0 => 1,
            RaidLevel::Raid1 => 2,
            RaidLevel::Raid2 | RaidLevel::Raid3 | RaidLevel::Raid4 | RaidLevel::Raid5 => 3,
            RaidLevel::Raid6 => 4,
        }
    }

    /// Number of disks' worth of capacity reserved for parity.
    ///
    /// Mirroring is not parity; RAID1 capacity is handled separately.
    pub fn parity_disks(self) -> usize {
        match self {
            RaidLevel::Raid0 | RaidLevel::Raid1 => 0,
            RaidLevel::Raid2 | RaidLevel::Raid3 | RaidLevel::Raid4 | RaidLevel::Raid5 => 1,
            RaidLevel::Raid6 => 2,
        }
    }

    /// The numeric level (0 through 6).
    pub fn level(self) -> u8 {
        match self {
            RaidLevel::Raid0 => 0,
            RaidLevel::Raid1 => 1,
            RaidLevel::Raid2 => 2,
            RaidLevel::Raid3 => 3,
            RaidLevel::Raid4 => 4,
            RaidLevel::Raid5 => 5,
            RaidLevel::Raid6 => 6,
        }
    }
}

impl fmt::Display for RaidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RAID{}", self.level())
    }
}

/// A "just a bunch of disks" storage with a configurable RAID level.
#[derive(Debug)]
pub struct JbodStorage {
    sim: WeakSimWorld,
    name: String,
    disks: Vec<Disk>,
    raid_level: Cell<RaidLevel>,
}

impl JbodStorage {
    /// Create a JBOD storage over the given disks.
    ///
    /// Fails with [`FsError::UnsupportedRaidLevel`] if the disk count
    /// cannot support the requested level.
    pub fn create(
        sim: &SimWorld,
        name: &str,
        disks: Vec<Disk>,
        raid_level: RaidLevel,
    ) -> FsResult<Rc<Self>> {
        Self::check_level(raid_level, disks.len())?;
        Ok(Rc::new(Self {
            sim: sim.downgrade(),
            name: name.to_string(),
            disks,
            raid_level: Cell::new(raid_level),
        }))
    }

    /// Change the RAID level, recomputing the effective capacity.
    ///
    /// Fails with [`FsError::UnsupportedRaidLevel`] if the current disk
    /// count cannot support the target level; the previous level is kept.
    pub fn set_raid_level(&self, raid_level: RaidLevel) -> FsResult<()> {
        Self::check_level(raid_level, self.disks.len())?;
        tracing::debug!(
            storage = %self.name,
            from = %self.raid_level.get(),
            to = %raid_level,
            "RAID level changed"
        );
        self.raid_level.set(raid_level);
        Ok(())
    }

    /// The disks backing this storage.
    pub fn disks(&self) -> &[Disk] {
        &self.disks
    }

    fn check_level(raid_level: RaidLevel, num_disks: usize) -> FsResult<()> {
        let required = raid_level.min_disks();
        if num_disks < required {
            return Err(FsError::UnsupportedRaidLevel {
                level: raid_level,
                required,
                actual: num_disks,
            });
        }
        Ok(())
    }

    /// Number of disks a read of this level stripes over.
    fn read_stripe_width(&self) -> u64 {
        let n = self.disks.len() as u64;
        match self.raid_level.get() {
            RaidLevel::Raid0 => n,
            RaidLevel::Raid1 => 1,
            RaidLevel::Raid2 | RaidLevel::Raid3 | RaidLevel::Raid4 | RaidLevel::Raid5 => n - 1,
            RaidLevel::Raid6 => n - 2,
        }
    }

    fn smallest_disk_capacity(&self) -> u64 {
        self.disks.iter().map(Disk::capacity).min().unwrap_or(0)
    }

    fn read_duration(&self, num_bytes: u64) -> Duration {
        match self.raid_level.get() {
            // Served in full by whichever mirror answers fastest.
            RaidLevel::Raid1 => self
                .disks
                .iter()
                .map(|d| d.transfer_duration(IoOp::Read, num_bytes))
                .min()
                .unwrap_or(Duration::ZERO),
            // Striped over the data disks; the slowest share gates completion.
            _ => {
                let width = self.read_stripe_width();
                let per_disk = num_bytes.div_ceil(width);
                self.disks
                    .iter()
                    .map(|d| d.transfer_duration(IoOp::Read, per_disk))
                    .max()
                    .unwrap_or(Duration::ZERO)
            }
        }
    }

    fn write_duration(&self, num_bytes: u64) -> Duration {
        let n = self.disks.len() as u64;
        let per_disk = match self.raid_level.get() {
            RaidLevel::Raid0 => num_bytes.div_ceil(n),
            // Every mirror receives the full payload.
            RaidLevel::Raid1 => num_bytes,
            // Data spread over n-1 disks, and the parity share makes the
            // write touch every disk with the same amount.
            RaidLevel::Raid2 | RaidLevel::Raid3 | RaidLevel::Raid4 | RaidLevel::Raid5 => {
                num_bytes.div_ceil(n - 1)
            }
            RaidLevel::Raid6 => num_bytes.div_ceil(n - 2),
        };
        self.disks
            .iter()
            .map(|d| d.transfer_duration(IoOp::Write, per_disk))
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

#[async_trait(?Send)]
impl Storage for JbodStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> u64 {
        let n = self.disks.len() as u64;
        match self.raid_level.get() {
            RaidLevel::Raid0 => self.disks.iter().map(Disk::capacity).sum(),
            RaidLevel::Raid1 => self.smallest_disk_capacity(),
            level => {
                let parity = level.parity_disks() as u64;
                self.smallest_disk_capacity() * (n - parity)
            }
        }
    }

    fn num_disks(&self) -> usize {
        self.disks.len()
    }

    fn raid_level(&self) -> RaidLevel {
        self.raid_level.get()
    }

    fn serve(&self, op: IoOp, num_bytes: u64) -> FsResult<IoActivity> {
        let sim = self.sim.upgrade()?;
        let duration = match op {
            IoOp::Read => self.read_duration(num_bytes),
            IoOp::Write => self.write_duration(num_bytes),
        };
        Ok(sim.schedule_io(op, num_bytes, duration))
    }
}
