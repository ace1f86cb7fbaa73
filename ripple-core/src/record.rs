//! Versioned record and change metadata.

use crate::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CHANGE KIND
// ============================================================================

/// Last mutation applied to a record.
///
/// Within one logical lifetime of a key the kind only moves forward:
/// `Added -> Updated* -> Removed`. A new `Added` record starts a fresh
/// lifetime after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

// ============================================================================
// RECORD
// ============================================================================

/// One versioned value stored under a key within a namespace.
///
/// The payload is opaque to this layer. Records are immutable-by-replacement:
/// a mutation overwrites the stored record, and subscribers that already
/// captured a record keep their own clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    /// Key, unique within its namespace.
    pub key: String,
    /// The payload.
    pub value: T,
    /// Last mutation applied.
    pub change: ChangeKind,
    /// Set once, at first creation.
    pub created_at: Timestamp,
    /// Refreshed on every mutation, including removal.
    pub updated_at: Timestamp,
}

impl<T> Record<T> {
    /// Create a fresh record for a key's first write.
    ///
    /// `created_at == updated_at` and the change kind is `Added`.
    pub fn new(key: impl Into<String>, value: T) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            value,
            change: ChangeKind::Added,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a new payload to an existing record.
    ///
    /// Moves the change kind to `Updated` and refreshes `updated_at`;
    /// `created_at` is preserved.
    pub fn update(&mut self, value: T) {
        self.value = value;
        self.change = ChangeKind::Updated;
        self.updated_at = Utc::now();
    }

    /// Mark the record as removed. Terminal for this key lifetime.
    pub fn mark_removed(&mut self) {
        self.change = ChangeKind::Removed;
        self.updated_at = Utc::now();
    }

    /// True once the record has been marked removed.
    pub fn is_removed(&self) -> bool {
        self.change == ChangeKind::Removed
    }
}

// ============================================================================
// NAMESPACE EVENTS
// ============================================================================

/// A batch of writes that just occurred within one namespace.
pub type NamespaceDelta<T> = HashMap<String, Record<T>>;

/// Payload carried on a namespace channel.
///
/// `Destroyed` signals the namespace was wiped; subscribers should treat it
/// as "invalidate everything cached for this namespace".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NamespaceEvent<T> {
    /// Delta map of the records written in one mutation.
    Changed(NamespaceDelta<T>),
    /// The whole namespace was destroyed.
    Destroyed,
}

impl<T> NamespaceEvent<T> {
    /// The delta map, or None for a destroyed namespace.
    pub fn delta(&self) -> Option<&NamespaceDelta<T>> {
        match self {
            Self::Changed(delta) => Some(delta),
            Self::Destroyed => None,
        }
    }

    /// Consume the event, keeping only a change delta.
    pub fn into_delta(self) -> Option<NamespaceDelta<T>> {
        match self {
            Self::Changed(delta) => Some(delta),
            Self::Destroyed => None,
        }
    }

    /// True if this event signals namespace destruction.
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_added() {
        let record = Record::new("alpha", 1);
        assert_eq!(record.key, "alpha");
        assert_eq!(record.value, 1);
        assert_eq!(record.change, ChangeKind::Added);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_update_moves_to_updated() {
        let mut record = Record::new("alpha", 1);
        let created = record.created_at;
        record.update(2);
        assert_eq!(record.value, 2);
        assert_eq!(record.change, ChangeKind::Updated);
        assert_eq!(record.created_at, created);
        assert!(record.updated_at >= created);
    }

    #[test]
    fn test_mark_removed_is_terminal_kind() {
        let mut record = Record::new("alpha", 1);
        record.update(2);
        record.mark_removed();
        assert!(record.is_removed());
        // The payload stays available to subscribers holding the record.
        assert_eq!(record.value, 2);
    }

    #[test]
    fn test_namespace_event_delta_accessors() {
        let mut delta = NamespaceDelta::new();
        delta.insert("alpha".to_string(), Record::new("alpha", 1));
        let changed = NamespaceEvent::Changed(delta);
        assert!(!changed.is_destroyed());
        assert_eq!(changed.delta().unwrap().len(), 1);
        assert!(changed.into_delta().is_some());

        let destroyed: NamespaceEvent<i32> = NamespaceEvent::Destroyed;
        assert!(destroyed.is_destroyed());
        assert!(destroyed.delta().is_none());
        assert!(destroyed.into_delta().is_none());
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
