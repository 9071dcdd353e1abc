//! Shared helpers for integration tests.

use simfs::{CachingScheme, Disk, FileSystem, OneDiskStorage, SimWorld};
use std::future::Future;

/// Drive an actor future to completion against the simulation.
///
/// Interleaves event processing with executor polls on a current-thread
/// runtime, so the future observes simulated time advancing exactly as
/// the event queue drains.
#[allow(dead_code)]
pub fn drive<T: 'static>(sim: &mut SimWorld, fut: impl Future<Output = T> + 'static) -> T {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");
    let local = tokio::task::LocalSet::new();

    local.block_on(&rt, async {
        let handle = tokio::task::spawn_local(fut);
        while !handle.is_finished() {
            while sim.pending_event_count() > 0 {
                sim.step();
            }
            tokio::task::yield_now().await;
        }
        handle.await.expect("task panicked")
    })
}

/// A disk with predictable timing: 1 MB/s both ways, no access latency,
/// so a transfer of n bytes takes exactly n microseconds.
#[allow(dead_code)]
pub fn linear_disk(name: &str, capacity: u64) -> Disk {
    Disk::new(name, capacity, 1_000_000, 1_000_000)
}

/// A file system with one partition of `size` bytes mounted at `/data`
/// on a single linear disk.
#[allow(dead_code)]
pub fn mounted_fs(sim: &SimWorld, scheme: CachingScheme, size: u64) -> FileSystem {
    let storage = OneDiskStorage::create(sim, "local", linear_disk("disk0", size));
    let fs = FileSystem::create(sim, "test_fs", FileSystem::DEFAULT_MAX_OPEN_FILES);
    fs.mount_partition("/data", storage, size, scheme)
        .expect("mount failed");
    fs
}
