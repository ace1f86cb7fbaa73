//! The process-wide coordinator and its read/write surface.

use crate::bus::NotificationBus;
use crate::config::StoreConfig;
use crate::lazy::LazyRecord;
use crate::loader::{LoadFn, TaskLoader};
use ripple_core::{NamespaceDelta, NamespaceEvent, Record, RippleResult, StoreError};
use ripple_storage::{CacheStore, DurableStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::error;

/// Cache mirror and channel registries, guarded together by the one
/// mutation lock so a write's durable update, cache update and publish
/// are observed as a single step.
struct CoordinatorState<T> {
    cache: CacheStore<T>,
    bus: NotificationBus<T>,
}

/// Reactive view over a durable, namespaced key-value store.
///
/// One instance per process is the intended shape, but nothing is global:
/// construct it with the durable store it fronts and inject it wherever it
/// is needed. Tests construct isolated instances freely.
///
/// All mutating operations, and reads that must be consistent with
/// in-flight writes, serialize on a single coarse lock across all
/// namespaces. That is an intentional simplicity trade-off and the known
/// scalability bound of this layer.
pub struct ReactiveStore<T, S> {
    store: Arc<S>,
    state: Arc<Mutex<CoordinatorState<T>>>,
    loader: Arc<TaskLoader<T>>,
    config: StoreConfig,
}

impl<T, S> ReactiveStore<T, S>
where
    T: Clone + Send + 'static,
    S: DurableStore<T> + 'static,
{
    /// Create a coordinator with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, StoreConfig::default())
    }

    /// Create a coordinator with the given configuration.
    pub fn with_config(store: S, config: StoreConfig) -> Self {
        let store = Arc::new(store);
        let state = Arc::new(Mutex::new(CoordinatorState {
            cache: CacheStore::new(),
            bus: NotificationBus::new(),
        }));

        // The loader resolves through the uncached read path, taking the
        // mutation lock like any other consistent read.
        let load: LoadFn<T> = {
            let store = Arc::clone(&store);
            let state = Arc::clone(&state);
            Arc::new(move |namespace, key| {
                let guard = state.lock().map_err(|_| StoreError::LockPoisoned)?;
                guard.cache.get(store.as_ref(), namespace, key, false)
            })
        };
        let loader = Arc::new(TaskLoader::with_completion(
            load,
            config.completion_handle.clone(),
        ));

        Self {
            store,
            state,
            loader,
            config,
        }
    }

    /// The configuration this coordinator was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The durable store behind this coordinator.
    pub fn store(&self) -> &S {
        self.store.as_ref()
    }

    /// Start the background loader. Must be called within a tokio runtime.
    pub fn start(&self) {
        self.loader.start();
    }

    /// Stop the background loader and disconnect every live subscriber.
    ///
    /// Queued loads that have not started are abandoned. The cache mirror
    /// is left intact.
    pub fn stop(&self) {
        self.loader.stop();
        if let Ok(mut state) = self.state.lock() {
            state.bus.clear();
        }
    }

    fn lock_state(&self) -> RippleResult<MutexGuard<'_, CoordinatorState<T>>> {
        self.state
            .lock()
            .map_err(|_| StoreError::LockPoisoned.into())
    }

    // ========================================================================
    // ONE-SHOT READS
    // ========================================================================

    /// Read one record, serving from the mirror when `use_cache` is set and
    /// the namespace is materialized.
    pub fn read_once(
        &self,
        namespace: &str,
        key: &str,
        use_cache: bool,
    ) -> RippleResult<Option<Record<T>>> {
        let state = self.lock_state()?;
        state.cache.get(self.store.as_ref(), namespace, key, use_cache)
    }

    /// Read a whole namespace. With `use_cache` the first full read
    /// materializes the namespace mirror.
    pub fn read_once_all(
        &self,
        namespace: &str,
        use_cache: bool,
    ) -> RippleResult<HashMap<String, Record<T>>> {
        let mut state = self.lock_state()?;
        state
            .cache
            .get_all(self.store.as_ref(), namespace, use_cache)
    }

    // ========================================================================
    // LIVE READS
    // ========================================================================

    /// Current record (if present) followed by every future mutation of
    /// the key, as one ordered stream.
    ///
    /// Snapshot capture and subscription activation happen under a single
    /// acquisition of the mutation lock, so no write can land between
    /// them. Buffering is unbounded: a slow consumer accumulates events
    /// rather than dropping them.
    pub fn read_live(
        &self,
        namespace: &str,
        key: &str,
    ) -> RippleResult<impl Stream<Item = Record<T>>> {
        let (snapshot, receiver) = {
            let mut state = self.lock_state()?;
            let snapshot = self.store.read(namespace, key)?;
            let receiver = state.bus.subscribe_key(namespace, key);
            (snapshot, receiver)
        };
        Ok(tokio_stream::iter(snapshot).chain(UnboundedReceiverStream::new(receiver)))
    }

    /// Current namespace snapshot followed by every future delta.
    ///
    /// The first emission is the full mapping; later emissions are the
    /// delta maps as published. Merging deltas over previous state is the
    /// consumer's concern. Destruction events are filtered out.
    pub fn read_live_all(
        &self,
        namespace: &str,
    ) -> RippleResult<impl Stream<Item = NamespaceDelta<T>>> {
        let (snapshot, receiver) = {
            let mut state = self.lock_state()?;
            let snapshot = state.cache.get_all(self.store.as_ref(), namespace, true)?;
            let receiver = state.bus.subscribe_namespace(namespace);
            (snapshot, receiver)
        };
        let updates = UnboundedReceiverStream::new(receiver).filter_map(NamespaceEvent::into_delta);
        Ok(tokio_stream::once(snapshot).chain(updates))
    }

    /// One lazy handle per key currently in the namespace, re-emitted as a
    /// fresh list for each namespace delta (built from the delta's key
    /// set). Values are never resolved eagerly.
    pub fn read_lazy_all(
        &self,
        namespace: &str,
    ) -> RippleResult<impl Stream<Item = Vec<LazyRecord<T>>>> {
        let (keys, receiver) = {
            let mut state = self.lock_state()?;
            let keys = self.store.list_keys(namespace)?;
            let receiver = state.bus.subscribe_namespace(namespace);
            (keys, receiver)
        };

        let namespace = namespace.to_string();
        let loader = Arc::clone(&self.loader);
        let initial: Vec<LazyRecord<T>> = keys
            .into_iter()
            .map(|key| LazyRecord::new(namespace.clone(), key, Arc::clone(&loader)))
            .collect();

        let updates = UnboundedReceiverStream::new(receiver).filter_map(move |event| {
            event.into_delta().map(|delta| {
                delta
                    .into_keys()
                    .map(|key| LazyRecord::new(namespace.clone(), key, Arc::clone(&loader)))
                    .collect::<Vec<_>>()
            })
        });
        Ok(tokio_stream::once(initial).chain(updates))
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Write one value.
    ///
    /// The prior record is read from the durable store (never the mirror)
    /// to decide Added vs Updated. The key channel and the namespace
    /// channel are always published; the mirror is updated only when
    /// `use_cache` is set.
    pub fn write(
        &self,
        namespace: &str,
        key: &str,
        value: T,
        use_cache: bool,
    ) -> RippleResult<()> {
        let mut state = self.lock_state()?;

        let record = match self.store.read(namespace, key)? {
            Some(mut existing) => {
                existing.update(value);
                existing
            }
            None => Record::new(key, value),
        };
        self.store.write(namespace, key, &record)?;

        state.bus.publish_key(namespace, key, &record);
        if use_cache {
            state.cache.put(namespace, key, record.clone());
        }

        let mut delta = NamespaceDelta::new();
        delta.insert(key.to_string(), record);
        state
            .bus
            .publish_namespace(namespace, &NamespaceEvent::Changed(delta));
        Ok(())
    }

    /// Write a batch of values as one namespace delta.
    ///
    /// With `use_cache` unset, per-key channel publishes and delta
    /// inclusion are both suppressed: the durable store is updated but
    /// key subscribers see nothing and the namespace channel carries an
    /// empty delta. Long-standing asymmetry with [`ReactiveStore::write`],
    /// kept deliberately.
    pub fn write_batch(
        &self,
        namespace: &str,
        entries: HashMap<String, T>,
        use_cache: bool,
    ) -> RippleResult<()> {
        let mut state = self.lock_state()?;

        let mut delta = NamespaceDelta::new();
        for (key, value) in entries {
            let record = match self.store.read(namespace, &key)? {
                Some(mut existing) => {
                    existing.update(value);
                    existing
                }
                None => Record::new(key.clone(), value),
            };
            self.store.write(namespace, &key, &record)?;

            if use_cache {
                state.bus.publish_key(namespace, &key, &record);
                delta.insert(key, record);
            }
        }

        if use_cache {
            state.cache.put_all(namespace, &delta);
        }
        state
            .bus
            .publish_namespace(namespace, &NamespaceEvent::Changed(delta));
        Ok(())
    }

    // ========================================================================
    // DELETES
    // ========================================================================

    /// Delete one key. A no-op (zero events) when the key does not exist.
    pub fn delete(&self, namespace: &str, key: &str) -> RippleResult<()> {
        let mut state = self.lock_state()?;

        let Some(mut record) = self.store.read(namespace, key)? else {
            return Ok(());
        };
        record.mark_removed();
        self.store.delete(namespace, key)?;

        state.bus.publish_key(namespace, key, &record);
        state.cache.remove(namespace, key);

        let mut delta = NamespaceDelta::new();
        delta.insert(key.to_string(), record);
        state
            .bus
            .publish_namespace(namespace, &NamespaceEvent::Changed(delta));
        Ok(())
    }

    /// Destroy a whole namespace.
    ///
    /// A durable-store failure here is logged and swallowed; subscribers
    /// are told the namespace is gone either way and the mirror entry is
    /// dropped.
    pub fn delete_namespace(&self, namespace: &str) -> RippleResult<()> {
        let mut state = self.lock_state()?;

        if let Err(err) = self.store.destroy(namespace) {
            error!(namespace, error = %err, "Namespace destroy failed");
        }

        state
            .bus
            .publish_namespace(namespace, &NamespaceEvent::Destroyed);
        state.cache.drop_namespace(namespace);
        Ok(())
    }
}

impl<T, S> Clone for ReactiveStore<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
            loader: Arc::clone(&self.loader),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
