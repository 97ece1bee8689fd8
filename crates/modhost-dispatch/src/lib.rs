#![forbid(unsafe_code)]

//! Tick-driven action queues with main-thread hand-off.
//!
//! # Role in ModHost
//!
//! A host application runs a single "main" thread plus one or more
//! long-lived background threads that tick on a fixed cadence. Work can
//! originate anywhere (network callbacks, worker pools, timers) but often
//! must run on a specific thread. This crate provides the marshalling
//! layer: a [`Dispatcher`] owned by a background subsystem, holding two
//! FIFO queues of deferred actions.
//!
//! - The **local queue** is drained on the owner thread itself, once per
//!   [`Dispatcher::tick`].
//! - The **hand-off queue** is drained only on the main thread: each tick
//!   that finds it non-empty submits a single hand-off unit to the host's
//!   [`MainThreadAcceptor`], and that unit drains the queue when the main
//!   thread gets around to running it.
//!
//! Producers never block: enqueueing is a constant-time append from any
//! thread.
//!
//! # Drain Discipline
//!
//! Every drain pass snapshots the queue depth at pass start and performs
//! exactly that many dequeues. An action that enqueues further work during
//! a pass therefore defers that work to the *next* tick, bounding the work
//! done per tick by the depth observed when the tick began. Draining
//! "until empty" would be a behavioral regression, not a refactor.
//!
//! # Failure Modes
//!
//! - **Panicking action**: caught per action; the pass logs the panic and
//!   continues with the next item. One bad action cannot take down a tick.
//! - **Dispose racing enqueue**: the losing enqueue is either discarded
//!   with the queue it landed in or dropped immediately; it never runs.
//! - **Enqueue after dispose**: accepted, never executed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use modhost_dispatch::{Dispatcher, MainThreadPump};
//!
//! // Main thread: create the pump and keep its receiving half here.
//! let pump = MainThreadPump::new();
//! let dispatcher = Arc::new(Dispatcher::new(Arc::new(pump.handle())));
//!
//! dispatcher.enqueue_local(|| println!("runs on the owner thread"));
//! dispatcher.enqueue_main_thread(|| println!("runs on the main thread"));
//!
//! // Owner thread: once per cycle.
//! dispatcher.tick(Duration::from_millis(16));
//!
//! // Main thread: run whatever hand-off units have arrived.
//! pump.pump();
//! ```

pub mod acceptor;
pub mod dispatcher;
mod queue;

pub use acceptor::{MainThreadAcceptor, MainThreadPump, PumpHandle};
pub use dispatcher::{ActionScheduler, Dispatcher};

#[cfg(any(test, feature = "test-helpers"))]
pub use acceptor::ManualAcceptor;

/// A deferred, zero-argument action.
///
/// Actions are `Send` so they can be enqueued from any thread and executed
/// on another. They run exactly once, or not at all if the dispatcher is
/// disposed first.
pub type Action = Box<dyn FnOnce() + Send + 'static>;
