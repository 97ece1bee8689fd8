#![forbid(unsafe_code)]

//! Change notification for settings objects that know nothing about it.
//!
//! # Role in ModHost
//!
//! Feature settings are plain structs owned by whoever configured them. A
//! settings owner that wants to react to edits — persist them, invalidate
//! caches — should not have to thread observer plumbing through every
//! settings type. This crate attaches observability from the outside:
//!
//! - [`ObserverRegistry`] owns one watch slot per concrete type, replacing
//!   hidden per-type statics with explicit, composition-root-owned state.
//! - [`Shared<T>`] is the reference-semantics handle a settings value lives
//!   behind. Its [`set`](Shared::set) method is the normal mutation path:
//!   mutate first, then notify.
//! - [`Watcher<T>`] is the handle returned by
//!   [`bind`](ObserverRegistry::bind); it fans a
//!   [`ChangeNotification`] out to subscribers whenever a field of the
//!   currently bound instance is set.
//!
//! # Single-target design
//!
//! At most one instance of each concrete type is watched per registry.
//! Every `Shared<T>` created by the registry goes through the interception
//! path on `set`, but only mutations of the *bound* instance notify;
//! co-existing instances are filtered out by identity. Re-binding switches
//! the target while keeping the same wrapper and subscriber list.
//!
//! # Invariants
//!
//! 1. Every completed `set` on the bound instance produces exactly one
//!    notification, delivered before `set` returns, on the mutating thread.
//! 2. Subscribers run in subscription order.
//! 3. `bind`/`unbind` and notification dispatch are mutually serialized:
//!    a notification is delivered iff the mutated instance is the bound
//!    target at delivery time.
//! 4. After [`Watcher::unbind`], mutating any instance of the type behaves
//!    as if the wrapper had never existed.
//!
//! # Example
//!
//! ```
//! use modhost_observe::ObserverRegistry;
//!
//! #[derive(Default)]
//! struct AudioSettings {
//!     volume: i32,
//!     muted: bool,
//! }
//!
//! let registry = ObserverRegistry::new();
//! let settings = registry.share(AudioSettings::default());
//! let watcher = registry.bind(&settings).unwrap();
//!
//! let _sub = watcher.subscribe(|note| {
//!     println!("{} changed", note.field);
//! });
//!
//! settings.set("volume", |s| s.volume = 75); // prints "volume changed"
//! ```

pub mod registry;
pub mod shared;
pub mod watcher;

pub use registry::{BindError, ObserverRegistry};
pub use shared::Shared;
pub use watcher::{ChangeNotification, Subscription, Watcher};
