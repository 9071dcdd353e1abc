//! Single-disk storage.

use crate::error::FsResult;
use crate::sim::{SimWorld, WeakSimWorld};
use crate::storage::disk::Disk;
use crate::storage::io::{IoActivity, IoOp};
use crate::storage::{RaidLevel, Storage};
use async_trait::async_trait;
use std::rc::Rc;

/// A storage backed by exactly one simulated disk.
#[derive(Debug)]
pub struct OneDiskStorage {
    sim: WeakSimWorld,
    name: String,
    disk: Disk,
}

impl OneDiskStorage {
    /// Create a one-disk storage attached to the simulation.
    pub fn create(sim: &SimWorld, name: &str, disk: Disk) -> Rc<Self> {
        Rc::new(Self {
            sim: sim.downgrade(),
            name: name.to_string(),
            disk,
        })
    }

    /// The underlying disk.
    pub fn disk(&self) -> &Disk {
        &self.disk
    }
}

#[async_trait(?Send)]
impl Storage for OneDiskStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> u64 {
        self.disk.capacity()
    }

    fn num_disks(&self) -> usize {
        1
    }

    fn raid_level(&self) -> RaidLevel {
        RaidLevel::Raid0
    }

    fn serve(&self, op: IoOp, num_bytes: u64) -> FsResult<IoActivity> {
        let sim = self.sim.upgrade()?;
        let duration = self.disk.transfer_duration(op, num_bytes);
        Ok(sim.schedule_io(op, num_bytes, duration))
    }
}
