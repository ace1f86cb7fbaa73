//! In-memory durable store implementation.

use crate::DurableStore;
use ripple_core::{Record, RippleResult, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type NamespaceMap<T> = HashMap<String, HashMap<String, Record<T>>>;

/// In-memory `DurableStore` implementation.
///
/// Backed by a namespace-to-records map behind an `RwLock`. Suitable as a
/// test double and for hosts that do not need persistence across restarts.
#[derive(Debug)]
pub struct MemoryStore<T> {
    namespaces: Arc<RwLock<NamespaceMap<T>>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            namespaces: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            namespaces: Arc::clone(&self.namespaces),
        }
    }
}

impl<T> MemoryStore<T> {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all stored data across every namespace.
    pub fn clear(&self) -> RippleResult<()> {
        self.namespaces
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .clear();
        Ok(())
    }

    /// Number of namespaces that currently hold at least one record.
    pub fn namespace_count(&self) -> usize {
        self.namespaces
            .read()
            .map(|namespaces| namespaces.len())
            .unwrap_or(0)
    }

    /// Number of records stored in a namespace.
    pub fn key_count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .ok()
            .and_then(|namespaces| namespaces.get(namespace).map(HashMap::len))
            .unwrap_or(0)
    }
}

impl<T: Clone + Send + Sync> DurableStore<T> for MemoryStore<T> {
    fn read(&self, namespace: &str, key: &str) -> RippleResult<Option<Record<T>>> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(namespaces
            .get(namespace)
            .and_then(|records| records.get(key))
            .cloned())
    }

    fn write(&self, namespace: &str, key: &str, record: &Record<T>) -> RippleResult<()> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> RippleResult<()> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        if let Some(records) = namespaces.get_mut(namespace) {
            records.remove(key);
        }
        Ok(())
    }

    fn destroy(&self, namespace: &str) -> RippleResult<()> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        namespaces.remove(namespace);
        Ok(())
    }

    fn list_keys(&self, namespace: &str) -> RippleResult<Vec<String>> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(namespaces
            .get(namespace)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_round_trips() {
        let store = MemoryStore::new();
        let record = Record::new("theme", "dark".to_string());
        store.write("settings", "theme", &record).unwrap();

        let read = store.read("settings", "theme").unwrap().unwrap();
        assert_eq!(read, record);
    }

    #[test]
    fn test_read_absent_key_is_none() {
        let store: MemoryStore<String> = MemoryStore::new();
        assert!(store.read("settings", "missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_absent_key_is_ok() {
        let store: MemoryStore<String> = MemoryStore::new();
        assert!(store.delete("settings", "missing").is_ok());
    }

    #[test]
    fn test_destroy_wipes_namespace_only() {
        let store = MemoryStore::new();
        store
            .write("settings", "theme", &Record::new("theme", 1))
            .unwrap();
        store
            .write("sessions", "current", &Record::new("current", 2))
            .unwrap();

        store.destroy("settings").unwrap();

        assert!(store.read("settings", "theme").unwrap().is_none());
        assert!(store.read("sessions", "current").unwrap().is_some());
        assert_eq!(store.namespace_count(), 1);
    }

    #[test]
    fn test_list_keys_enumerates_namespace() {
        let store = MemoryStore::new();
        store.write("ns", "a", &Record::new("a", 1)).unwrap();
        store.write("ns", "b", &Record::new("b", 2)).unwrap();

        let mut keys = store.list_keys("ns").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(store.list_keys("empty").unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let store = MemoryStore::new();
        let alias = store.clone();
        store.write("ns", "a", &Record::new("a", 1)).unwrap();
        assert!(alias.read("ns", "a").unwrap().is_some());
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// The last write under each key wins, and list_keys enumerates
        /// exactly the distinct keys written.
        #[test]
        fn prop_last_write_wins_and_keys_match(
            writes in prop::collection::vec(("[a-e]", any::<i64>()), 1..24),
        ) {
            let store = MemoryStore::new();
            for (key, value) in &writes {
                store.write("ns", key, &Record::new(key.clone(), *value)).unwrap();
            }

            let mut expected: HashMap<&str, i64> = HashMap::new();
            for (key, value) in &writes {
                expected.insert(key.as_str(), *value);
            }

            for (key, value) in &expected {
                let record = store.read("ns", key).unwrap().unwrap();
                prop_assert_eq!(record.value, *value);
            }

            let listed: HashSet<String> = store.list_keys("ns").unwrap().into_iter().collect();
            let written: HashSet<String> = writes.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(listed, written);
        }
    }
}
