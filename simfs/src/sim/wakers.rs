//! Waker bookkeeping for async coordination with the event loop.

use std::collections::HashMap;
use std::task::Waker;

/// Registry of wakers for tasks sleeping on simulation time.
///
/// I/O activities keep their waker inline in their own state; only
/// timer-based sleeps go through this registry.
#[derive(Debug, Default)]
pub(crate) struct WakerRegistry {
    pub(crate) task_wakers: HashMap<u64, Waker>,
}
