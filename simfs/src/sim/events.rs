//! Event types and queue for the simulation.
//!
//! Events are ordered by scheduled time, with a monotonically increasing
//! sequence number breaking ties so that events scheduled at the same
//! instant are processed in scheduling order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

/// Events that can be scheduled in the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A sleeping task should be woken.
    Timer {
        /// Identifier of the sleeping task.
        task_id: u64,
    },

    /// A storage transfer reached its completion time.
    ///
    /// Processing marks the matching I/O activity as completed and wakes
    /// any task waiting on it. Activities cancelled before this event
    /// fires are simply skipped.
    Io {
        /// Identifier of the I/O activity.
        io_id: u64,
    },
}

/// An event bound to its scheduled time and tie-breaking sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    time: Duration,
    sequence: u64,
    event: Event,
}

impl ScheduledEvent {
    /// Create a scheduled event.
    pub fn new(time: Duration, event: Event, sequence: u64) -> Self {
        Self {
            time,
            sequence,
            event,
        }
    }

    /// The simulated time at which the event fires.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Consume the scheduled wrapper and return the event itself.
    pub fn into_event(self) -> Event {
        self.event
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that BinaryHeap pops the earliest event first.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A time-ordered queue of scheduled events.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the queue.
    pub fn schedule(&mut self, event: ScheduledEvent) {
        self.heap.push(event);
    }

    /// Remove and return the earliest event, if any.
    pub fn pop_earliest(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop()
    }

    /// Whether the queue holds no events.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of events waiting to be processed.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
