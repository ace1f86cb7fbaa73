//! Per-namespace read-through mirror of the durable store.

use crate::DurableStore;
use ripple_core::{NamespaceDelta, Record, RippleResult};
use std::collections::HashMap;
use tracing::debug;

/// In-memory mirror of recently-read namespaces.
///
/// A namespace is materialized the first time it is read in full with
/// caching enabled, and stays materialized until the namespace is dropped
/// or the cache is cleared. The cache itself carries no lock: the owning
/// coordinator serializes every operation under its single mutation lock,
/// and passes the durable store in on the read paths.
#[derive(Debug)]
pub struct CacheStore<T> {
    namespaces: HashMap<String, HashMap<String, Record<T>>>,
}

impl<T> Default for CacheStore<T> {
    fn default() -> Self {
        Self {
            namespaces: HashMap::new(),
        }
    }
}

impl<T: Clone> CacheStore<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a namespace has been materialized.
    pub fn is_materialized(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Number of materialized namespaces.
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// Read one record through the cache.
    ///
    /// Serves from the mirror only when `use_cache` is set and the
    /// namespace is materialized and contains the key; every other case is
    /// a durable read. A single miss never populates the mirror.
    pub fn get<S>(
        &self,
        store: &S,
        namespace: &str,
        key: &str,
        use_cache: bool,
    ) -> RippleResult<Option<Record<T>>>
    where
        S: DurableStore<T> + ?Sized,
    {
        if use_cache {
            if let Some(record) = self
                .namespaces
                .get(namespace)
                .and_then(|records| records.get(key))
            {
                return Ok(Some(record.clone()));
            }
        }
        store.read(namespace, key)
    }

    /// Read a whole namespace through the cache.
    ///
    /// A materialized namespace with `use_cache` set returns a copy of the
    /// mirror. Otherwise every key is enumerated and read from the durable
    /// store (keys that vanish between listing and reading are skipped),
    /// and the result materializes the namespace only when `use_cache` is
    /// set.
    pub fn get_all<S>(
        &mut self,
        store: &S,
        namespace: &str,
        use_cache: bool,
    ) -> RippleResult<HashMap<String, Record<T>>>
    where
        S: DurableStore<T> + ?Sized,
    {
        if use_cache {
            if let Some(records) = self.namespaces.get(namespace) {
                return Ok(records.clone());
            }
        }

        let mut records = HashMap::new();
        for key in store.list_keys(namespace)? {
            if let Some(record) = store.read(namespace, &key)? {
                records.insert(key, record);
            }
        }

        if use_cache {
            debug!(namespace, records = records.len(), "Materialized namespace");
            self.namespaces
                .insert(namespace.to_string(), records.clone());
        }
        Ok(records)
    }

    /// Overwrite a cached entry.
    ///
    /// Only updates a namespace that is already materialized; an isolated
    /// write never creates the namespace mapping as a side effect.
    pub fn put(&mut self, namespace: &str, key: &str, record: Record<T>) {
        if let Some(records) = self.namespaces.get_mut(namespace) {
            records.insert(key.to_string(), record);
        }
    }

    /// Overwrite cached entries from a delta map, same materialization rule
    /// as [`CacheStore::put`].
    pub fn put_all(&mut self, namespace: &str, delta: &NamespaceDelta<T>) {
        if let Some(records) = self.namespaces.get_mut(namespace) {
            for (key, record) in delta {
                records.insert(key.clone(), record.clone());
            }
        }
    }

    /// Delete a cached entry if present.
    pub fn remove(&mut self, namespace: &str, key: &str) {
        if let Some(records) = self.namespaces.get_mut(namespace) {
            records.remove(key);
        }
    }

    /// Remove an entire namespace mapping.
    pub fn drop_namespace(&mut self, namespace: &str) {
        self.namespaces.remove(namespace);
    }

    /// Drop every materialized namespace.
    pub fn clear(&mut self) {
        self.namespaces.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================
