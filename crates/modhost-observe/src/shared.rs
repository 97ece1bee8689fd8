#![forbid(unsafe_code)]

//! The shared settings cell and its tracked mutation path.
//!
//! [`Shared<T>`] gives a settings value reference semantics: clones are
//! handles to the same cell, and identity (which instance is which) is the
//! cell's pointer identity. All mutation flows through
//! [`set`](Shared::set), which performs the genuine mutation first and
//! only then consults the type's watch state — so a notification always
//! describes a change that has already taken effect.
//!
//! # Failure Modes
//!
//! - **Re-entrant mutation**: calling `set` (or `bind`/`unbind`) from
//!   inside a subscriber callback deadlocks on the type's dispatch lock.
//!   Re-entrant mutation indicates a design bug in the subscriber graph;
//!   reads (`get`, `with`) and `subscribe` are safe from callbacks.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::watcher::WatchState;

/// Interior of a [`Shared<T>`]; its allocation address is the instance's
/// identity.
pub(crate) struct SharedCell<T> {
    pub(crate) value: Mutex<T>,
}

/// A reference-semantics handle to a settings value admitted to an
/// [`ObserverRegistry`](crate::ObserverRegistry).
///
/// Cloning a `Shared` creates a new handle to the **same** value; the
/// registry's wrapper never owns the value's lifetime (it keeps only a
/// weak reference to the cell).
pub struct Shared<T> {
    pub(crate) cell: Arc<SharedCell<T>>,
    pub(crate) watch: Arc<WatchState<T>>,
}

// Manual Clone: shares the same cell, regardless of whether T is Clone.
impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            watch: Arc::clone(&self.watch),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("value", &*self.cell.value.lock())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Shared<T> {
    pub(crate) fn new(value: T, watch: Arc<WatchState<T>>) -> Self {
        Self {
            cell: Arc::new(SharedCell {
                value: Mutex::new(value),
            }),
            watch,
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.value.lock().clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.value.lock())
    }

    /// Set one named field: the normal mutation path.
    ///
    /// Applies `mutate` under the value lock, releases it, then — if this
    /// instance is the type's currently bound target — delivers one
    /// [`ChangeNotification`](crate::ChangeNotification) carrying `field`
    /// to every subscriber, synchronously, on the calling thread. Mutations
    /// of instances that are not the bound target are silent.
    ///
    /// The notification fires whether or not `mutate` actually changed the
    /// stored value: completing the setter is what counts, matching how
    /// settings owners use edits as a save trigger.
    pub fn set(&self, field: &'static str, mutate: impl FnOnce(&mut T)) {
        {
            let mut value = self.cell.value.lock();
            mutate(&mut value);
        }
        self.watch.notify(self, field);
    }

    /// Whether two handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.cell, &b.cell)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
