#![forbid(unsafe_code)]

//! Umbrella crate for the ModHost core facilities.
//!
//! Two independent subsystems, composed by the embedding host:
//!
//! - [`observe`]: change notification for settings objects that know
//!   nothing about observation — bind a watcher to an instance, subscribe,
//!   and react to every field edit.
//! - [`dispatch`]: tick-driven action queues that let work originating on
//!   any thread run either on a background owner thread's cadence or on
//!   the designated main thread.
//!
//! The subsystems share no types; depend on the individual crates instead
//! if you only need one.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use modhost::{Dispatcher, MainThreadPump, ObserverRegistry};
//!
//! #[derive(Default)]
//! struct HudSettings {
//!     scale: f32,
//! }
//!
//! // Composition root: one registry, one pump on the main thread.
//! let registry = ObserverRegistry::new();
//! let pump = MainThreadPump::new();
//! let dispatcher = Arc::new(Dispatcher::new(Arc::new(pump.handle())));
//!
//! // A settings owner reacts to edits by scheduling main-thread work.
//! let settings = registry.share(HudSettings::default());
//! let watcher = registry.bind(&settings).unwrap();
//! let _sub = watcher.subscribe({
//!     let dispatcher = Arc::clone(&dispatcher);
//!     move |note| {
//!         let field = note.field;
//!         dispatcher.enqueue_main_thread(move || {
//!             println!("rebuilding HUD after {field} change");
//!         });
//!     }
//! });
//!
//! settings.set("scale", |s| s.scale = 1.5);
//! dispatcher.tick(Duration::from_millis(16)); // owner thread
//! pump.pump(); // main thread
//! ```

pub use modhost_dispatch as dispatch;
pub use modhost_observe as observe;

pub use modhost_dispatch::{Action, ActionScheduler, Dispatcher, MainThreadAcceptor, MainThreadPump, PumpHandle};
pub use modhost_observe::{
    BindError, ChangeNotification, ObserverRegistry, Shared, Subscription, Watcher,
};

#[cfg(feature = "test-helpers")]
pub use modhost_dispatch::ManualAcceptor;
