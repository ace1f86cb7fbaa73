//! Ripple Test Utils - Generators and Store Stubs
//!
//! Proptest strategies for namespaces, keys and values, plus a
//! call-counting durable-store wrapper used to prove cache-hit behavior.

use proptest::prelude::*;
use ripple_core::{Record, RippleResult};
use ripple_storage::DurableStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

/// Strategy producing namespace names.
pub fn namespace_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

/// Strategy producing keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,16}"
}

/// Strategy producing string payloads.
pub fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,;:_-]{0,48}"
}

/// Strategy producing non-empty batch-write entry maps.
pub fn entries_strategy(max_entries: usize) -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map(key_strategy(), value_strategy(), 1..max_entries)
}

// ============================================================================
// COUNTING STORE
// ============================================================================

/// Durable-store wrapper counting calls by operation.
///
/// Wrap any [`DurableStore`] to verify, for example, that a cached read
/// performs no durable read at all.
#[derive(Debug, Default)]
pub struct CountingStore<S> {
    inner: S,
    reads: AtomicUsize,
    writes: AtomicUsize,
    deletes: AtomicUsize,
    destroys: AtomicUsize,
    lists: AtomicUsize,
}

impl<S> CountingStore<S> {
    /// Wrap a store with zeroed counters.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of `read` calls seen.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write` calls seen.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls seen.
    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Number of `destroy` calls seen.
    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    /// Number of `list_keys` calls seen.
    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
        self.deletes.store(0, Ordering::SeqCst);
        self.destroys.store(0, Ordering::SeqCst);
        self.lists.store(0, Ordering::SeqCst);
    }
}

impl<T, S: DurableStore<T>> DurableStore<T> for CountingStore<S> {
    fn read(&self, namespace: &str, key: &str) -> RippleResult<Option<Record<T>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(namespace, key)
    }

    fn write(&self, namespace: &str, key: &str, record: &Record<T>) -> RippleResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(namespace, key, record)
    }

    fn delete(&self, namespace: &str, key: &str) -> RippleResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(namespace, key)
    }

    fn destroy(&self, namespace: &str) -> RippleResult<()> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        self.inner.destroy(namespace)
    }

    fn list_keys(&self, namespace: &str) -> RippleResult<Vec<String>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_keys(namespace)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_storage::MemoryStore;

    #[test]
    fn test_counting_store_tracks_operations() {
        let store = CountingStore::new(MemoryStore::new());

        store.write("ns", "a", &Record::new("a", 1)).unwrap();
        store.read("ns", "a").unwrap();
        store.read("ns", "b").unwrap();
        store.list_keys("ns").unwrap();
        store.delete("ns", "a").unwrap();
        store.destroy("ns").unwrap();

        assert_eq!(store.writes(), 1);
        assert_eq!(store.reads(), 2);
        assert_eq!(store.lists(), 1);
        assert_eq!(store.deletes(), 1);
        assert_eq!(store.destroys(), 1);

        store.reset();
        assert_eq!(store.reads(), 0);
        assert_eq!(store.writes(), 0);
    }
}
