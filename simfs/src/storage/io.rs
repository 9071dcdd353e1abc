//! Operation handles for in-flight simulated transfers.
//!
//! Every read or write served by a [`crate::storage::Storage`] is
//! represented by an [`IoActivity`]: an explicit handle with a
//! `Pending -> Completed | Cancelled` state machine that the caller
//! queries or awaits, rather than callback machinery. Bytes transferred
//! so far are interpolated linearly over the transfer window, which gives
//! a documented, testable partial-progress model for cancellation.

use crate::error::{FsError, FsResult};
use crate::sim::WeakSimWorld;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

/// Direction of a simulated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoOp {
    /// Bytes move from the storage to the caller.
    Read,
    /// Bytes move from the caller to the storage.
    Write,
}

/// Lifecycle of an I/O activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStatus {
    /// The transfer is in flight.
    Pending,
    /// The transfer ran to completion.
    Completed,
    /// The transfer was cancelled; the byte count is frozen.
    Cancelled,
}

/// Shared state of one in-flight transfer.
#[derive(Debug)]
pub(crate) struct IoActivityState {
    pub(crate) id: u64,
    pub(crate) op: IoOp,
    pub(crate) total_bytes: u64,
    pub(crate) started_at: Duration,
    pub(crate) completes_at: Duration,
    pub(crate) status: IoStatus,
    /// Final byte count once Completed or Cancelled.
    pub(crate) transferred: u64,
    pub(crate) waker: Option<Waker>,
}

impl IoActivityState {
    /// Bytes moved by time `now`, linear in elapsed transfer time.
    fn transferred_at(&self, now: Duration) -> u64 {
        match self.status {
            IoStatus::Completed | IoStatus::Cancelled => self.transferred,
            IoStatus::Pending => {
                let window = self.completes_at.saturating_sub(self.started_at);
                let elapsed = now.saturating_sub(self.started_at);
                if window.is_zero() || elapsed >= window {
                    self.total_bytes
                } else {
                    let fraction = elapsed.as_secs_f64() / window.as_secs_f64();
                    (self.total_bytes as f64 * fraction) as u64
                }
            }
        }
    }
}

/// Table of in-flight activities owned by the simulation world.
#[derive(Debug, Default)]
pub(crate) struct IoState {
    pending: HashMap<u64, Rc<RefCell<IoActivityState>>>,
    next_id: u64,
}

impl IoState {
    pub(crate) fn insert(
        &mut self,
        op: IoOp,
        total_bytes: u64,
        started_at: Duration,
        completes_at: Duration,
    ) -> Rc<RefCell<IoActivityState>> {
        let id = self.next_id;
        self.next_id += 1;

        let state = Rc::new(RefCell::new(IoActivityState {
            id,
            op,
            total_bytes,
            started_at,
            completes_at,
            status: IoStatus::Pending,
            transferred: 0,
            waker: None,
        }));
        self.pending.insert(id, state.clone());
        state
    }

    pub(crate) fn remove(&mut self, id: u64) -> Option<Rc<RefCell<IoActivityState>>> {
        self.pending.remove(&id)
    }
}

/// Handle to one simulated transfer.
///
/// Returned immediately by the asynchronous storage and file operations.
/// The caller can poll the transferred byte count at any time, await
/// completion via [`IoActivity::wait`], or cancel.
#[derive(Debug, Clone)]
pub struct IoActivity {
    sim: WeakSimWorld,
    state: Rc<RefCell<IoActivityState>>,
}

impl IoActivity {
    pub(crate) fn new(sim: WeakSimWorld, state: Rc<RefCell<IoActivityState>>) -> Self {
        Self { sim, state }
    }

    pub(crate) fn id(&self) -> u64 {
        self.state.borrow().id
    }

    /// Direction of this transfer.
    pub fn op(&self) -> IoOp {
        self.state.borrow().op
    }

    /// Total bytes this transfer was asked to move.
    pub fn total_bytes(&self) -> u64 {
        self.state.borrow().total_bytes
    }

    /// Simulated time at which the transfer started.
    pub fn started_at(&self) -> Duration {
        self.state.borrow().started_at
    }

    /// Simulated time at which the transfer completes (or would have,
    /// if cancelled first).
    pub fn completion_time(&self) -> Duration {
        self.state.borrow().completes_at
    }

    /// Whether the transfer is still in flight.
    pub fn is_pending(&self) -> bool {
        self.state.borrow().status == IoStatus::Pending
    }

    /// Whether the transfer ran to completion.
    pub fn is_completed(&self) -> bool {
        self.state.borrow().status == IoStatus::Completed
    }

    /// Whether the transfer was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().status == IoStatus::Cancelled
    }

    /// Bytes transferred so far.
    ///
    /// For a pending transfer this is interpolated against the current
    /// simulation time; for a completed or cancelled transfer it is the
    /// final count.
    pub fn transferred_now(&self) -> FsResult<u64> {
        let state = self.state.borrow();
        match state.status {
            IoStatus::Pending => {
                let sim = self.sim.upgrade()?;
                Ok(state.transferred_at(sim.now()))
            }
            IoStatus::Completed | IoStatus::Cancelled => Ok(state.transferred),
        }
    }

    /// Cancel the transfer, freezing the byte count at the current
    /// simulation time. Returns the bytes transferred so far.
    ///
    /// Cancelling a transfer that already completed is a no-op and
    /// returns the full count. The already-scheduled completion event
    /// is skipped when it fires.
    pub fn cancel(&self) -> FsResult<u64> {
        let sim = self.sim.upgrade()?;
        let (id, waker, transferred) = {
            let mut state = self.state.borrow_mut();
            match state.status {
                IoStatus::Pending => {
                    let transferred = state.transferred_at(sim.now());
                    state.status = IoStatus::Cancelled;
                    state.transferred = transferred;
                    (state.id, state.waker.take(), transferred)
                }
                IoStatus::Completed | IoStatus::Cancelled => {
                    return Ok(state.transferred);
                }
            }
        };

        sim.forget_io(id);
        tracing::debug!(io_id = id, transferred, "transfer cancelled");
        if let Some(waker) = waker {
            waker.wake();
        }
        Ok(transferred)
    }

    /// Await completion (or cancellation) of the transfer.
    ///
    /// Resolves to the final transferred byte count.
    pub fn wait(&self) -> IoFuture {
        IoFuture {
            sim: self.sim.clone(),
            state: self.state.clone(),
        }
    }
}

/// Future resolving to the final byte count of an [`IoActivity`].
///
/// Follows the schedule -> wait -> complete pattern: the completion event
/// processed by the world flips the state and wakes the registered waker.
pub struct IoFuture {
    sim: WeakSimWorld,
    state: Rc<RefCell<IoActivityState>>,
}

impl Future for IoFuture {
    type Output = FsResult<u64>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.sim.upgrade().is_err() {
            return Poll::Ready(Err(FsError::SimulationShutdown));
        }

        let mut state = self.state.borrow_mut();
        match state.status {
            IoStatus::Completed | IoStatus::Cancelled => Poll::Ready(Ok(state.transferred)),
            IoStatus::Pending => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
