#![forbid(unsafe_code)]

//! Mutex-guarded FIFO of deferred actions with snapshot-count draining.
//!
//! The queue is the only shared mutable state in the dispatcher. Access
//! pattern: any number of concurrent producers, at most one drainer at a
//! time (the owner thread for the local queue, the main thread for the
//! hand-off queue). The lock is held only for individual push/pop
//! operations — never while an action executes — so a drain pass cannot
//! deadlock with an action that enqueues more work.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::Action;

pub(crate) struct ActionQueue {
    items: Mutex<VecDeque<Action>>,
}

impl ActionQueue {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Append `action`, unless `closed` has been raised.
    ///
    /// The flag is checked under the queue lock, which is the same lock
    /// [`clear`](Self::clear) takes: an enqueue serialized before the
    /// close lands in the queue and is discarded by the subsequent clear;
    /// one serialized after is dropped here. Either way a closed queue
    /// never hands the action to a drain pass.
    pub(crate) fn push_unless(&self, closed: &AtomicBool, action: Action) -> bool {
        let mut items = self.items.lock();
        if closed.load(Ordering::Acquire) {
            return false;
        }
        items.push_back(action);
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Discard everything queued, returning how many actions were dropped.
    pub(crate) fn clear(&self) -> usize {
        let mut items = self.items.lock();
        let dropped = items.len();
        items.clear();
        dropped
    }

    /// Execute one bounded drain pass on the calling thread.
    ///
    /// Snapshots the depth at pass start and performs exactly that many
    /// dequeue attempts, so actions enqueued mid-pass (including by the
    /// actions themselves) wait for the next pass. Returns the number of
    /// actions that were dequeued and invoked.
    pub(crate) fn drain_pass(&self) -> usize {
        let budget = self.items.lock().len();
        let mut ran = 0;
        for _ in 0..budget {
            let Some(action) = self.items.lock().pop_front() else {
                break;
            };
            run_contained(action);
            ran += 1;
        }
        ran
    }
}

/// Run a single action inside a panic boundary.
///
/// A panicking action is logged and swallowed so the rest of the batch
/// still runs; it is not retried.
fn run_contained(action: Action) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(action)) {
        tracing::error!(
            panic = %panic_message(payload.as_ref()),
            "queued action panicked; continuing drain pass"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
