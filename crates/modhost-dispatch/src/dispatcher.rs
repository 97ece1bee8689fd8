#![forbid(unsafe_code)]

//! The two-queue dispatcher owned by a background subsystem.
//!
//! One [`Dispatcher`] belongs to one owner thread, which calls
//! [`tick`](Dispatcher::tick) once per cycle. The host guarantees those
//! calls are serialized; everything else — enqueueing from arbitrary
//! threads, disposing during shutdown — is safe concurrently.
//!
//! # Ordering
//!
//! Each queue is FIFO. There is no order between the two queues: the local
//! drain completes before the hand-off unit is even submitted, but the main
//! thread runs that unit at an arbitrary later point relative to subsequent
//! ticks.
//!
//! # Lifecycle
//!
//! [`dispose`](Dispatcher::dispose) makes the dispatcher inert: both queues
//! are cleared, queued actions are discarded, and later enqueues are
//! accepted but never executed. Disposing twice is a no-op, as is ticking
//! a disposed dispatcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::Action;
use crate::acceptor::MainThreadAcceptor;
use crate::queue::ActionQueue;

/// Object-safe interface over the two enqueue operations.
///
/// Hosts that run a dispatcher per side (client and server, say) can hand
/// subsystems a `&dyn ActionScheduler` and keep the concrete dispatcher
/// private.
pub trait ActionScheduler: Send + Sync {
    /// Defer `action` to the owner thread's next tick.
    fn enqueue_local(&self, action: Action);

    /// Defer `action` to the main thread.
    fn enqueue_main_thread(&self, action: Action);
}

struct DispatchState {
    local: ActionQueue,
    handoff: ActionQueue,
    disposed: AtomicBool,
}

/// Two-queue cross-thread dispatcher.
///
/// Cloning produces another handle to the same queues; producers usually
/// share the dispatcher behind an `Arc` instead.
pub struct Dispatcher {
    state: Arc<DispatchState>,
    acceptor: Arc<dyn MainThreadAcceptor>,
}

impl Clone for Dispatcher {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            acceptor: Arc::clone(&self.acceptor),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher that submits hand-off units to `acceptor`.
    ///
    /// The acceptor is the host's promise that submitted units run strictly
    /// on the main thread, in submission order.
    #[must_use]
    pub fn new(acceptor: Arc<dyn MainThreadAcceptor>) -> Self {
        Self {
            state: Arc::new(DispatchState {
                local: ActionQueue::new(),
                handoff: ActionQueue::new(),
                disposed: AtomicBool::new(false),
            }),
            acceptor,
        }
    }

    /// Defer `action` to the owner thread's next tick.
    ///
    /// Constant-time append; never blocks; safe from any thread.
    pub fn enqueue_local(&self, action: impl FnOnce() + Send + 'static) {
        self.state
            .local
            .push_unless(&self.state.disposed, Box::new(action));
    }

    /// Defer `action` to the main thread.
    ///
    /// The action stays queued until a tick observes the queue non-empty
    /// and the main thread runs the resulting hand-off unit.
    pub fn enqueue_main_thread(&self, action: impl FnOnce() + Send + 'static) {
        self.state
            .handoff
            .push_unless(&self.state.disposed, Box::new(action));
    }

    /// Run one owner-thread cycle.
    ///
    /// Drains the local queue (snapshot-count pass, FIFO, on the calling
    /// thread), then submits a single hand-off unit if the main-thread
    /// queue is non-empty. Must only be called by the host's scheduler on
    /// the owner thread, never concurrently with itself.
    pub fn tick(&self, dt: Duration) {
        let state = &self.state;
        if state.disposed.load(Ordering::Acquire) {
            return;
        }

        let ran = state.local.drain_pass();
        tracing::trace!(ran, dt_us = dt.as_micros() as u64, "tick drained local queue");

        // One unit per tick, even when a previously submitted unit has not
        // run yet: every unit drains a snapshot of whatever is queued when
        // it executes, so extras fall through as zero-work passes.
        if !state.handoff.is_empty() && !state.disposed.load(Ordering::Acquire) {
            let shared = Arc::clone(state);
            self.acceptor.accept(Box::new(move || {
                if shared.disposed.load(Ordering::Acquire) {
                    return;
                }
                let ran = shared.handoff.drain_pass();
                tracing::trace!(ran, "hand-off unit drained main-thread queue");
            }));
        }
    }

    /// Discard all queued work and make the dispatcher inert.
    ///
    /// Safe to call from any thread, concurrently with in-flight enqueues:
    /// an enqueue that loses the race is either discarded with the queue it
    /// landed in or dropped immediately — it never executes. Calling
    /// dispose again is a no-op.
    pub fn dispose(&self) {
        if self.state.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let dropped = self.state.local.clear() + self.state.handoff.clear();
        tracing::debug!(dropped, "dispatcher disposed; queued actions discarded");
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.disposed.load(Ordering::Acquire)
    }
}

impl ActionScheduler for Dispatcher {
    fn enqueue_local(&self, action: Action) {
        self.state.local.push_unless(&self.state.disposed, action);
    }

    fn enqueue_main_thread(&self, action: Action) {
        self.state.handoff.push_unless(&self.state.disposed, action);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
