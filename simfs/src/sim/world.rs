//! Core simulation world and coordination logic.
//!
//! `SimWorld` owns all mutable simulation state and provides the main
//! interface for scheduling events and advancing simulation time. It uses
//! a centralized ownership model with handle-based access: components hold
//! [`WeakSimWorld`] references and upgrade them on demand, so dropping the
//! world cleanly invalidates every outstanding handle.

use std::{
    cell::RefCell,
    collections::HashSet,
    rc::{Rc, Weak},
    task::Waker,
    time::Duration,
};
use tracing::instrument;

use crate::error::{FsError, FsResult};
use crate::storage::io::{IoActivity, IoOp, IoState, IoStatus};

use super::{
    events::{Event, EventQueue, ScheduledEvent},
    sleep::SleepFuture,
    wakers::WakerRegistry,
};

/// Internal simulation state holder.
#[derive(Debug)]
pub(crate) struct SimInner {
    pub(crate) current_time: Duration,
    pub(crate) event_queue: EventQueue,
    pub(crate) next_sequence: u64,

    // In-flight storage transfers
    pub(crate) io: IoState,

    // Async coordination
    pub(crate) wakers: WakerRegistry,

    // Task management for sleep functionality
    pub(crate) next_task_id: u64,
    pub(crate) awakened_tasks: HashSet<u64>,

    // Event processing metrics
    pub(crate) events_processed: u64,
}

impl SimInner {
    fn new() -> Self {
        Self {
            current_time: Duration::ZERO,
            event_queue: EventQueue::new(),
            next_sequence: 0,
            io: IoState::default(),
            wakers: WakerRegistry::default(),
            next_task_id: 0,
            awakened_tasks: HashSet::new(),
            events_processed: 0,
        }
    }
}

/// The central simulation coordinator that manages time and event processing.
///
/// All timing in the file-system layer flows through a `SimWorld`: storage
/// transfers schedule their completion here, and the logical clock only
/// advances when [`SimWorld::step`] processes the next event.
#[derive(Debug)]
pub struct SimWorld {
    pub(crate) inner: Rc<RefCell<SimInner>>,
}

/// A weak handle to a [`SimWorld`].
///
/// Held by storages, partitions and file systems so that they do not keep
/// the simulation alive. Upgrading fails with
/// [`FsError::SimulationShutdown`] once the world has been dropped.
#[derive(Debug, Clone)]
pub struct WeakSimWorld {
    inner: Weak<RefCell<SimInner>>,
}

impl WeakSimWorld {
    /// Attempt to recover a strong handle to the simulation.
    pub fn upgrade(&self) -> FsResult<SimWorld> {
        self.inner
            .upgrade()
            .map(|inner| SimWorld { inner })
            .ok_or(FsError::SimulationShutdown)
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    /// Creates a new simulation world with the clock at zero.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SimInner::new())),
        }
    }

    /// Processes the next scheduled event and advances time.
    ///
    /// Returns `true` if more events are available for processing,
    /// `false` if this was the last event or the queue was empty.
    #[instrument(skip(self))]
    pub fn step(&mut self) -> bool {
        let mut inner = self.inner.borrow_mut();

        if let Some(scheduled_event) = inner.event_queue.pop_earliest() {
            // Advance logical time to the event timestamp
            inner.current_time = scheduled_event.time();
            Self::process_event_with_inner(&mut inner, scheduled_event.into_event());
            !inner.event_queue.is_empty()
        } else {
            false
        }
    }

    /// Processes all scheduled events until the queue is empty.
    #[instrument(skip(self))]
    pub fn run_until_empty(&mut self) {
        while self.step() {}
    }

    /// Returns the current simulation time.
    pub fn current_time(&self) -> Duration {
        self.inner.borrow().current_time
    }

    /// Returns the current simulation time (alias of [`SimWorld::current_time`]).
    pub fn now(&self) -> Duration {
        self.current_time()
    }

    /// Number of events processed since the world was created.
    pub fn events_processed(&self) -> u64 {
        self.inner.borrow().events_processed
    }

    /// Schedules an event to execute after the specified delay.
    pub fn schedule_event(&self, event: Event, delay: Duration) {
        let mut inner = self.inner.borrow_mut();
        let scheduled_time = inner.current_time + delay;
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        inner
            .event_queue
            .schedule(ScheduledEvent::new(scheduled_time, event, sequence));
    }

    /// Creates a weak reference to this simulation world.
    pub fn downgrade(&self) -> WeakSimWorld {
        WeakSimWorld {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if there are events waiting to be processed.
    pub fn has_pending_events(&self) -> bool {
        !self.inner.borrow().event_queue.is_empty()
    }

    /// Returns the number of events waiting to be processed.
    pub fn pending_event_count(&self) -> usize {
        self.inner.borrow().event_queue.len()
    }

    /// Sleep for the specified duration in simulation time.
    ///
    /// Returns a future that completes once the simulation clock has
    /// advanced by `duration`, which only happens as events are stepped.
    pub fn sleep(&self, duration: Duration) -> SleepFuture {
        let task_id = {
            let mut inner = self.inner.borrow_mut();
            let task_id = inner.next_task_id;
            inner.next_task_id += 1;
            task_id
        };

        self.schedule_event(Event::Timer { task_id }, duration);
        SleepFuture::new(self.downgrade(), task_id)
    }

    /// Begin a simulated transfer of `total_bytes`, completing after `duration`.
    ///
    /// The returned activity starts in the `Pending` state and completes
    /// when the scheduled `Io` event is processed.
    pub(crate) fn schedule_io(&self, op: IoOp, total_bytes: u64, duration: Duration) -> IoActivity {
        let mut inner = self.inner.borrow_mut();
        let started_at = inner.current_time;
        let completes_at = started_at + duration;
        let state = inner.io.insert(op, total_bytes, started_at, completes_at);
        let io_id = state.borrow().id;

        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.event_queue.schedule(ScheduledEvent::new(
            completes_at,
            Event::Io { io_id },
            sequence,
        ));

        tracing::trace!(
            io_id,
            ?op,
            total_bytes,
            completes_at_us = completes_at.as_micros() as u64,
            "scheduled transfer"
        );

        IoActivity::new(self.downgrade(), state)
    }

    /// Forget an in-flight activity (called on cancellation).
    pub(crate) fn forget_io(&self, io_id: u64) {
        self.inner.borrow_mut().io.remove(io_id);
    }

    /// Check if a sleeping task has been awakened.
    pub(crate) fn is_task_awake(&self, task_id: u64) -> bool {
        self.inner.borrow().awakened_tasks.contains(&task_id)
    }

    /// Register a waker for a sleeping task.
    pub(crate) fn register_task_waker(&self, task_id: u64, waker: Waker) {
        let mut inner = self.inner.borrow_mut();
        inner.wakers.task_wakers.insert(task_id, waker);
    }

    /// Static event processor for simulation events.
    #[instrument(skip(inner))]
    fn process_event_with_inner(inner: &mut SimInner, event: Event) {
        inner.events_processed += 1;

        match event {
            Event::Timer { task_id } => Self::handle_timer_event(inner, task_id),
            Event::Io { io_id } => Self::handle_io_event(inner, io_id),
        }
    }

    /// Handle timer events - wake sleeping tasks.
    fn handle_timer_event(inner: &mut SimInner, task_id: u64) {
        inner.awakened_tasks.insert(task_id);
        if let Some(waker) = inner.wakers.task_wakers.remove(&task_id) {
            waker.wake();
        }
    }

    /// Handle transfer completion events.
    ///
    /// Activities cancelled before their completion event fires have
    /// already been removed from the in-flight table; their event is a no-op.
    fn handle_io_event(inner: &mut SimInner, io_id: u64) {
        let Some(state) = inner.io.remove(io_id) else {
            tracing::trace!(io_id, "completion event for cancelled transfer");
            return;
        };

        let waker = {
            let mut state = state.borrow_mut();
            if state.status == IoStatus::Pending {
                state.status = IoStatus::Completed;
                state.transferred = state.total_bytes;
            }
            state.waker.take()
        };

        tracing::trace!(io_id, "transfer completed");
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}
