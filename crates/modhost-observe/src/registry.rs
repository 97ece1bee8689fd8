#![forbid(unsafe_code)]

//! Explicit per-type registry of watch state.
//!
//! The registry replaces hidden per-type statics: it is owned by the
//! host's composition root, and its lifetime bounds the lifetime of every
//! wrapper it hands out. Dropping the registry (and every `Shared` created
//! through it) drops all watch state with it — nothing leaks across tests
//! or across host reloads.
//!
//! One watch slot exists per concrete type; slots are created lazily on
//! first [`share`](ObserverRegistry::share) or
//! [`bind`](ObserverRegistry::bind) and never replaced, so every instance
//! of a type observes the same slot across bind/unbind cycles.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::shared::Shared;
use crate::watcher::{WatchState, Watcher};

/// A binding rejected at [`ObserverRegistry::bind`] time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// The instance was created through a different registry; its
    /// mutations report to that registry's watch slot, so binding it here
    /// could never observe anything.
    #[error("instance was created through a different observer registry")]
    ForeignInstance,
}

/// Registry mapping type identity to that type's watch state.
///
/// Cloning produces another handle to the **same** registry.
pub struct ObserverRegistry {
    types: Arc<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

// Manual Clone: shares the same type map.
impl Clone for ObserverRegistry {
    fn clone(&self) -> Self {
        Self {
            types: Arc::clone(&self.types),
        }
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("types", &self.types.lock().len())
            .finish()
    }
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Admit `value` into the registry's mutation path.
    ///
    /// The returned [`Shared`] handle is the value's identity; clones of
    /// the handle are the same instance. Works for any type — including
    /// one with no mutable fields, whose wrapper is simply silent.
    pub fn share<T: Send + 'static>(&self, value: T) -> Shared<T> {
        Shared::new(value, self.state_for::<T>())
    }

    /// Bind the type's wrapper to `instance`.
    ///
    /// If no wrapper for the type exists, installs one watching
    /// `instance`. If one already exists, re-targets it (the wrapper
    /// identity and subscriber list are kept) and returns a handle to the
    /// same wrapper — idempotent with respect to installation, not with
    /// respect to which instance is watched.
    pub fn bind<T: Send + 'static>(&self, instance: &Shared<T>) -> Result<Watcher<T>, BindError> {
        let state = self.state_for::<T>();
        if !Arc::ptr_eq(&state, &instance.watch) {
            return Err(BindError::ForeignInstance);
        }
        let epoch = state.bind_target(&instance.cell);
        tracing::debug!(
            type_name = std::any::type_name::<T>(),
            epoch,
            "change watcher bound"
        );
        Ok(Watcher::new(state, epoch))
    }

    /// The lazily created watch slot for `T`.
    fn state_for<T: Send + 'static>(&self) -> Arc<WatchState<T>> {
        let mut types = self.types.lock();
        let slot = types
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Arc::new(WatchState::<T>::new())));
        slot.downcast_ref::<Arc<WatchState<T>>>()
            .expect("watch slot holds the state for its own TypeId")
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
