#![forbid(unsafe_code)]

//! Per-type watch state, bind handles, and subscription guards.
//!
//! # Design
//!
//! Each concrete settings type gets one [`WatchState`] per registry. It
//! tracks the bound target (weakly — the wrapper never owns the watched
//! instance), an ordered subscriber list, and an epoch counter. The epoch
//! makes unbinding final for handles minted before it: a later `bind` of
//! the same type starts a fresh wrapper generation, and stale handles and
//! their subscriptions stay inert instead of reviving.
//!
//! # Locking
//!
//! Two locks with distinct jobs:
//!
//! - `inner` guards the state itself and is only ever held briefly.
//! - `dispatch` serializes `bind`/`unbind` with notification delivery, so
//!   the "compare target, then notify" step is atomic with respect to
//!   re-targeting. It is held *across* subscriber callbacks; that is what
//!   makes the re-entrancy rules in [`shared`](crate::shared) necessary.
//!
//! # Invariants
//!
//! 1. Subscribers are invoked in subscription order.
//! 2. Dead subscribers (dropped [`Subscription`] guards) are pruned lazily
//!    during delivery.
//! 3. A notification is delivered iff the mutated instance is the bound
//!    target at delivery time.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::shared::{Shared, SharedCell};

type Callback<T> = Arc<dyn Fn(&ChangeNotification<T>) + Send + Sync>;
type CallbackWeak<T> = Weak<dyn Fn(&ChangeNotification<T>) + Send + Sync>;

/// Immutable record of one intercepted mutation: which instance, which
/// field.
pub struct ChangeNotification<T> {
    /// The instance that was mutated (always the bound target).
    pub instance: Shared<T>,
    /// Name of the field the setter touched.
    pub field: &'static str,
}

impl<T> Clone for ChangeNotification<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            field: self.field,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ChangeNotification<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotification")
            .field("field", &self.field)
            .field("instance", &self.instance)
            .finish()
    }
}

struct WatchInner<T> {
    /// Wrapper generation. Bumped when observation is (re)installed;
    /// handles carry the epoch they were minted under.
    epoch: u64,
    /// Whether observation is currently installed for the type.
    active: bool,
    /// Identity of the watched instance. `Weak`: the caller that created
    /// the value retains ownership.
    target: Option<Weak<SharedCell<T>>>,
    subscribers: Vec<CallbackWeak<T>>,
}

/// Shared per-type watch state. One per (registry, type), created lazily
/// and never replaced, so every `Shared` cell of the type keeps pointing
/// at the live state across bind/unbind cycles.
pub(crate) struct WatchState<T> {
    dispatch: Mutex<()>,
    inner: Mutex<WatchInner<T>>,
}

impl<T: Send + 'static> WatchState<T> {
    pub(crate) fn new() -> Self {
        Self {
            dispatch: Mutex::new(()),
            inner: Mutex::new(WatchInner {
                epoch: 0,
                active: false,
                target: None,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Install or re-target observation; returns the wrapper epoch.
    ///
    /// First bind (or bind after unbind) starts a new generation with an
    /// empty subscriber list; re-bind while active keeps the wrapper and
    /// its subscribers and only switches the target.
    pub(crate) fn bind_target(&self, cell: &Arc<SharedCell<T>>) -> u64 {
        let _serialized = self.dispatch.lock();
        let mut inner = self.inner.lock();
        if !inner.active {
            inner.active = true;
            inner.epoch += 1;
            inner.subscribers.clear();
        }
        inner.target = Some(Arc::downgrade(cell));
        inner.epoch
    }

    /// Remove observation installed under `epoch`.
    ///
    /// No-op for stale handles and for repeated calls: once unbound, the
    /// type behaves as if the wrapper had never existed.
    pub(crate) fn release_target(&self, epoch: u64) {
        let _serialized = self.dispatch.lock();
        let mut inner = self.inner.lock();
        if inner.epoch != epoch || !inner.active {
            return;
        }
        inner.active = false;
        inner.target = None;
        inner.subscribers.clear();
        tracing::debug!(
            type_name = std::any::type_name::<T>(),
            "change watcher unbound"
        );
    }

    /// Register a subscriber minted under `epoch`.
    ///
    /// If the handle's generation is no longer the live one, the callback
    /// is accepted but never registered — subscribe-after-unbind succeeds
    /// and is simply never invoked.
    pub(crate) fn subscribe(
        &self,
        epoch: u64,
        callback: impl Fn(&ChangeNotification<T>) + Send + Sync + 'static,
    ) -> Subscription {
        let strong: Callback<T> = Arc::new(callback);
        {
            let mut inner = self.inner.lock();
            if inner.active && inner.epoch == epoch {
                inner.subscribers.push(Arc::downgrade(&strong));
            }
        }
        // The guard keeps the callback alive; the state only holds a Weak.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver a notification for `instance` if it is the bound target.
    ///
    /// Called from `Shared::set` after the genuine mutation. The whole
    /// compare-and-deliver step runs under the dispatch lock, so it cannot
    /// interleave with `bind`/`unbind`.
    pub(crate) fn notify(&self, instance: &Shared<T>, field: &'static str) {
        let _serialized = self.dispatch.lock();
        let live: Vec<Callback<T>> = {
            let mut inner = self.inner.lock();
            if !inner.active {
                return;
            }
            let Some(target) = inner.target.as_ref() else {
                return;
            };
            if !std::ptr::eq(target.as_ptr(), Arc::as_ptr(&instance.cell)) {
                tracing::trace!(field, "mutation on unbound instance filtered");
                return;
            }
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        // `inner` is released before callbacks run (so callbacks may read
        // or subscribe); `dispatch` stays held (so re-targeting cannot
        // slip between the identity check and delivery).
        tracing::trace!(field, subscribers = live.len(), "delivering change");
        let note = ChangeNotification {
            instance: instance.clone(),
            field,
        };
        for callback in &live {
            callback(&note);
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        let inner = self.inner.lock();
        inner.active && inner.epoch == epoch
    }

    fn watches_cell(&self, epoch: u64, cell: &Arc<SharedCell<T>>) -> bool {
        let inner = self.inner.lock();
        inner.active
            && inner.epoch == epoch
            && inner
                .target
                .as_ref()
                .is_some_and(|target| std::ptr::eq(target.as_ptr(), Arc::as_ptr(cell)))
    }
}

/// Handle to the wrapper watching one concrete type.
///
/// All handles minted for the same wrapper generation are interchangeable:
/// they share the subscriber list and the bound target. Handles outlive
/// [`unbind`](Self::unbind) harmlessly — they just go inert.
pub struct Watcher<T> {
    state: Arc<WatchState<T>>,
    epoch: u64,
}

// Manual Clone: handles share the same watch state.
impl<T> Clone for Watcher<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            epoch: self.epoch,
        }
    }
}

impl<T> std::fmt::Debug for Watcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Watcher<T> {
    pub(crate) fn new(state: Arc<WatchState<T>>, epoch: u64) -> Self {
        Self { state, epoch }
    }

    /// Subscribe to mutations of the bound instance.
    ///
    /// Callbacks run synchronously on the mutating thread, in subscription
    /// order. Dropping the returned [`Subscription`] unsubscribes.
    pub fn subscribe(
        &self,
        callback: impl Fn(&ChangeNotification<T>) + Send + Sync + 'static,
    ) -> Subscription {
        self.state.subscribe(self.epoch, callback)
    }

    /// Remove observation for the type entirely.
    ///
    /// Afterwards, mutating any instance of the type behaves exactly as if
    /// the wrapper had never existed. Calling unbind again, or through
    /// another stale handle, is a no-op.
    pub fn unbind(&self) {
        self.state.release_target(self.epoch);
    }

    /// Whether this handle's wrapper generation is still installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_current(self.epoch)
    }

    /// Whether `instance` is the currently bound target of this wrapper.
    #[must_use]
    pub fn watches(&self, instance: &Shared<T>) -> bool {
        self.state.watches_cell(self.epoch, &instance.cell)
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the guard drops the only strong reference to the callback, so
/// the `Weak` in the watch state fails to upgrade and is pruned on the
/// next delivery.
pub struct Subscription {
    _guard: Box<dyn std::any::Any + Send + Sync>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
