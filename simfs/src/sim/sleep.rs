//! Sleep future for simulation time.

use crate::error::{FsError, FsResult};
use crate::sim::WeakSimWorld;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by [`crate::SimWorld::sleep`].
///
/// Completes once the simulation clock has advanced past the wake time,
/// i.e. once the matching `Timer` event has been processed.
pub struct SleepFuture {
    sim: WeakSimWorld,
    task_id: u64,
}

impl SleepFuture {
    pub(crate) fn new(sim: WeakSimWorld, task_id: u64) -> Self {
        Self { sim, task_id }
    }
}

impl Future for SleepFuture {
    type Output = FsResult<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let sim = match self.sim.upgrade() {
            Ok(sim) => sim,
            Err(_) => return Poll::Ready(Err(FsError::SimulationShutdown)),
        };

        if sim.is_task_awake(self.task_id) {
            Poll::Ready(Ok(()))
        } else {
            sim.register_task_waker(self.task_id, cx.waker().clone());
            Poll::Pending
        }
    }
}
