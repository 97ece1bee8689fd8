#![forbid(unsafe_code)]

//! The main-thread side of the hand-off protocol.
//!
//! [`MainThreadAcceptor`] is the host collaborator contract: an acceptor
//! promises that every submitted unit runs strictly on the main thread, in
//! submission order. Hosts with their own main-thread task queue implement
//! the trait over it; hosts without one can use [`MainThreadPump`], which
//! feeds units through an unbounded channel to a receiving half that lives
//! on the main thread.
//!
//! Units are run as-is: a unit produced by the dispatcher already contains
//! its own per-action panic boundary, so the pump does not add another.

use std::sync::mpsc;

use crate::Action;

#[cfg(any(test, feature = "test-helpers"))]
use std::collections::VecDeque;

#[cfg(any(test, feature = "test-helpers"))]
use parking_lot::Mutex;

/// Executes submitted units strictly on the main thread.
///
/// The dispatcher calls [`accept`](Self::accept) from the owner thread;
/// the implementation must arrange for `unit` to run on the main thread
/// later, preserving submission order. `accept` itself must not block.
pub trait MainThreadAcceptor: Send + Sync {
    /// Submit one unit for main-thread execution.
    fn accept(&self, unit: Action);
}

/// Channel-backed acceptor for hosts without a main-thread task queue.
///
/// Create the pump on the main thread, hand [`handle`](Self::handle)
/// clones to dispatchers, and call [`pump`](Self::pump) from the main
/// loop. The pump is deliberately not `Sync`: the receiving half belongs
/// to exactly one thread.
pub struct MainThreadPump {
    tx: mpsc::Sender<Action>,
    rx: mpsc::Receiver<Action>,
}

impl Default for MainThreadPump {
    fn default() -> Self {
        Self::new()
    }
}

impl MainThreadPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// A cloneable sending half implementing [`MainThreadAcceptor`].
    #[must_use]
    pub fn handle(&self) -> PumpHandle {
        PumpHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run every unit currently queued, on the calling thread.
    ///
    /// Returns the number of units executed. Non-blocking: if nothing has
    /// arrived, returns 0 immediately.
    pub fn pump(&self) -> usize {
        let mut ran = 0;
        while let Ok(unit) = self.rx.try_recv() {
            unit();
            ran += 1;
        }
        ran
    }
}

/// Sending half of a [`MainThreadPump`].
#[derive(Clone)]
pub struct PumpHandle {
    tx: mpsc::Sender<Action>,
}

impl MainThreadAcceptor for PumpHandle {
    fn accept(&self, unit: Action) {
        // A send error means the pump is gone, i.e. the main loop has shut
        // down; the unit is discarded with it.
        if self.tx.send(unit).is_err() {
            tracing::debug!("main-thread pump dropped; hand-off unit discarded");
        }
    }
}

/// Test acceptor that records units and runs them on demand.
///
/// [`run_pending`](Self::run_pending) executes units on the calling
/// thread, letting a test play the role of the main thread. Uses the same
/// snapshot-count pass as the dispatcher's queues, so a unit that submits
/// further units defers them to the next call.
#[cfg(any(test, feature = "test-helpers"))]
pub struct ManualAcceptor {
    units: Mutex<VecDeque<Action>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl ManualAcceptor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: Mutex::new(VecDeque::new()),
        }
    }

    /// Number of units submitted but not yet run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.units.lock().len()
    }

    /// Run the units currently queued, in submission order; returns how
    /// many ran.
    pub fn run_pending(&self) -> usize {
        let budget = self.units.lock().len();
        let mut ran = 0;
        for _ in 0..budget {
            let Some(unit) = self.units.lock().pop_front() else {
                break;
            };
            unit();
            ran += 1;
        }
        ran
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Default for ManualAcceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl MainThreadAcceptor for ManualAcceptor {
    fn accept(&self, unit: Action) {
        self.units.lock().push_back(unit);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
