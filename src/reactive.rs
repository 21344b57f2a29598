//! The observable-state seam.
//!
//! The container core only needs four things from a reactive runtime: wrap a
//! state object so writes are observable, cache derived values, deep-watch
//! with sync or deferred notification, and dispose superseded bindings on
//! the next idle tick. [`ObservedState`] provides the first and third;
//! derivation caching lives with the routing snapshot (see `routing`), and
//! [`dispose_deferred`] covers disposal. Substituting a different
//! observable-store primitive means replacing this module only.
//!
//! # Guarantees
//!
//! - Writes are versioned: every write bumps a monotonic counter, which is
//!   what getter caches key on.
//! - Observers run synchronously, in registration order, after the write is
//!   applied and the value lock is released; an observer may freely read
//!   the state or trigger further writes.
//! - No payload is delivered; observers re-read whatever they care about.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

struct Observer {
    id: u64,
    notify: Arc<dyn Fn() + Send + Sync>,
}

/// A versioned root state value with synchronous deep-change observers.
pub struct ObservedState {
    value: RwLock<Value>,
    version: AtomicU64,
    observers: Mutex<Vec<Observer>>,
    next_id: AtomicU64,
}

impl ObservedState {
    pub fn new(value: Value) -> Self {
        Self {
            value: RwLock::new(value),
            version: AtomicU64::new(0),
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// The current write version. Bumps exactly once per [`write`](Self::write).
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Clone the current value.
    pub fn snapshot(&self) -> Value {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.value.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Clone the current value together with the version it was written at.
    /// Taken under one lock acquisition, so the pair is always coherent.
    pub fn versioned_snapshot(&self) -> (u64, Value) {
        let guard = self.value.read().unwrap_or_else(PoisonError::into_inner);
        (self.version.load(Ordering::Acquire), guard.clone())
    }

    /// Apply a write, bump the version, and notify every observer.
    ///
    /// The value lock is released before observers run, so observers may
    /// read or write the state; a write from an observer recurses through
    /// this same path synchronously.
    pub fn write<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        let out = {
            let mut guard = self.value.write().unwrap_or_else(PoisonError::into_inner);
            let out = f(&mut guard);
            // Bumped while the lock is held so readers taking the lock
            // always pair a value with its own version.
            self.version.fetch_add(1, Ordering::AcqRel);
            out
        };
        let observers: Vec<Arc<dyn Fn() + Send + Sync>> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|o| o.notify.clone())
            .collect();
        for notify in observers {
            notify();
        }
        out
    }

    /// Register a deep-change observer. Returns an id for [`unobserve`](Self::unobserve).
    pub fn observe(&self, notify: impl Fn() + Send + Sync + 'static) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Observer {
                id,
                notify: Arc::new(notify),
            });
        id
    }

    pub fn unobserve(&self, id: u64) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|o| o.id != id);
    }

    #[cfg(test)]
    pub(crate) fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for ObservedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservedState")
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

/// Drop a superseded binding on the next idle tick, letting in-flight
/// readers of the old snapshot finish first. Outside a tokio runtime the
/// binding is dropped immediately; this is a deferral, not a
/// synchronization point.
pub(crate) fn dispose_deferred<T: Send + 'static>(superseded: T) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::task::yield_now().await;
                drop(superseded);
            });
        }
        Err(_) => {
            debug!("no runtime present; disposing superseded binding immediately");
            drop(superseded);
        }
    }
}
