//! Deferred references to (namespace, key) pairs.

use crate::loader::TaskLoader;
use ripple_core::{Record, RippleResult};
use std::fmt;
use std::sync::{Arc, Mutex};

/// A deferred reference to one (namespace, key) pair.
///
/// The handle never resolves eagerly: callers pick the synchronous path
/// ([`LazyRecord::resolve`], blocking, for callers already off the critical
/// thread) or the loader queue ([`LazyRecord::resolve_async`]). A producer
/// can pre-attach a record with [`LazyRecord::cache_record`] to spare the
/// consumer a redundant resolve; the slot is consume-once.
pub struct LazyRecord<T> {
    namespace: String,
    key: String,
    loader: Arc<TaskLoader<T>>,
    cached: Mutex<Option<Record<T>>>,
}

impl<T> fmt::Debug for LazyRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRecord")
            .field("namespace", &self.namespace)
            .field("key", &self.key)
            .finish()
    }
}

impl<T> LazyRecord<T> {
    /// Create a handle for one (namespace, key) pair.
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        loader: Arc<TaskLoader<T>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            loader,
            cached: Mutex::new(None),
        }
    }

    /// The namespace this handle points into.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The key this handle points at.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolve synchronously, bypassing the loader queue.
    pub fn resolve(&self) -> RippleResult<Option<Record<T>>> {
        self.loader.load_sync(&self.namespace, &self.key)
    }

    /// Resolve through the loader queue; `on_complete` runs on the
    /// loader's completion context once the record is available. On load
    /// failure or an absent key the callback is never invoked.
    pub fn resolve_async(&self, on_complete: impl FnOnce(Record<T>) + Send + 'static) {
        self.loader.submit(&self.namespace, &self.key, on_complete);
    }

    /// Stash a record in the handle's single slot.
    pub fn cache_record(&self, record: Record<T>) {
        *self.cached.lock().expect("lazy slot poisoned") = Some(record);
    }

    /// Return and clear the stashed record, if any.
    pub fn poll_cached(&self) -> Option<Record<T>> {
        self.cached.lock().expect("lazy slot poisoned").take()
    }
}

// ============================================================================
// TESTS
// ============================================================================
