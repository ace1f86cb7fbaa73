//! Ripple Reactive - Live Views over a Durable Key-Value Store
//!
//! This crate is the reactive layer of the ripple workspace. It lets many
//! independent consumers observe the current value and all subsequent
//! changes of a single key, or of an entire namespace, without each
//! consumer re-querying the durable store.
//!
//! # Architecture
//!
//! - [`ReactiveStore`] is the process-wide coordinator. It owns the
//!   per-namespace cache mirror and both channel registries, all guarded by
//!   one mutation lock, so a write's durable update, cache update and
//!   notification publish are observed together.
//! - [`NotificationBus`] fans mutations out to live subscribers. Each
//!   subscriber owns its own unbounded queue; there is no replay for late
//!   subscribers and a publish with no subscribers is dropped.
//! - [`TaskLoader`] drains deferred load requests on a single background
//!   worker in FIFO order and redelivers each result on a designated
//!   completion context.
//! - [`LazyRecord`] is a deferred reference to a (namespace, key) pair,
//!   resolvable synchronously or through the loader.
//!
//! # Example
//!
//! ```ignore
//! let store = ReactiveStore::new(MemoryStore::new());
//! store.start();
//!
//! let mut live = store.read_live("settings", "theme")?;
//! store.write("settings", "theme", "dark".to_string(), true)?;
//! // `live` yields the snapshot (if any) followed by the write above.
//! ```

mod bus;
mod config;
mod lazy;
mod loader;
mod store;

pub use bus::NotificationBus;
pub use config::StoreConfig;
pub use lazy::LazyRecord;
pub use loader::{LoadFn, TaskLoader};
pub use store::ReactiveStore;

// Re-export core types for convenience
pub use ripple_core::{
    ChangeKind, NamespaceDelta, NamespaceEvent, Record, RippleError, RippleResult,
};
pub use ripple_storage::{CacheStore, DurableStore, MemoryStore};
