//! Mutation fan-out to live subscribers.
//!
//! Registries of per-key and per-namespace channels. Every subscriber owns
//! its own unbounded queue, so one slow consumer buffers without stalling
//! or dropping events for the others, and cancelling one subscription
//! never affects the rest. There is no history: a subscriber sees only
//! events published after it subscribed, and a publish with no subscribers
//! is dropped.

use ripple_core::{NamespaceEvent, Record};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

/// Per-key and per-namespace broadcast registries.
///
/// A channel entry is created on first subscribe or first publish for its
/// key, and is reused for the life of the owning coordinator. The bus has
/// no lock of its own: the coordinator's mutation lock guards it, which is
/// what makes "publish happens with the write" observable as one step.
pub struct NotificationBus<T> {
    key_channels: HashMap<(String, String), Vec<mpsc::UnboundedSender<Record<T>>>>,
    namespace_channels: HashMap<String, Vec<mpsc::UnboundedSender<NamespaceEvent<T>>>>,
}

impl<T> Default for NotificationBus<T> {
    fn default() -> Self {
        Self {
            key_channels: HashMap::new(),
            namespace_channels: HashMap::new(),
        }
    }
}

impl<T: Clone> NotificationBus<T> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every future mutation of one key.
    pub fn subscribe_key(
        &mut self,
        namespace: &str,
        key: &str,
    ) -> mpsc::UnboundedReceiver<Record<T>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.key_channels
            .entry((namespace.to_string(), key.to_string()))
            .or_default()
            .push(tx);
        rx
    }

    /// Subscribe to every future delta (or destruction) of one namespace.
    pub fn subscribe_namespace(
        &mut self,
        namespace: &str,
    ) -> mpsc::UnboundedReceiver<NamespaceEvent<T>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.namespace_channels
            .entry(namespace.to_string())
            .or_default()
            .push(tx);
        rx
    }

    /// Push a record to all current subscribers of a key channel.
    ///
    /// Never fails; subscribers whose receiver is gone are pruned.
    pub fn publish_key(&mut self, namespace: &str, key: &str, record: &Record<T>) {
        let senders = self
            .key_channels
            .entry((namespace.to_string(), key.to_string()))
            .or_default();
        senders.retain(|tx| tx.send(record.clone()).is_ok());
        debug!(
            namespace,
            key,
            subscribers = senders.len(),
            "Published key event"
        );
    }

    /// Push a namespace event to all current subscribers of its channel.
    pub fn publish_namespace(&mut self, namespace: &str, event: &NamespaceEvent<T>) {
        let senders = self
            .namespace_channels
            .entry(namespace.to_string())
            .or_default();
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        debug!(
            namespace,
            subscribers = senders.len(),
            destroyed = event.is_destroyed(),
            "Published namespace event"
        );
    }

    /// Number of key channels ever subscribed or written.
    pub fn key_channel_count(&self) -> usize {
        self.key_channels.len()
    }

    /// Number of namespace channels ever subscribed or written.
    pub fn namespace_channel_count(&self) -> usize {
        self.namespace_channels.len()
    }

    /// Drop both registries, disconnecting every subscriber.
    pub fn clear(&mut self) {
        self.key_channels.clear();
        self.namespace_channels.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::ChangeKind;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let mut bus = NotificationBus::new();
        let mut first = bus.subscribe_key("ns", "a");
        let mut second = bus.subscribe_key("ns", "a");

        bus.publish_key("ns", "a", &Record::new("a", 1));

        assert_eq!(first.try_recv().unwrap().value, 1);
        assert_eq!(second.try_recv().unwrap().value, 1);
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let mut bus = NotificationBus::new();
        bus.publish_key("ns", "a", &Record::new("a", 1));
        assert_eq!(bus.key_channel_count(), 1);

        // A later subscriber never sees the earlier publish.
        let mut rx = bus.subscribe_key("ns", "a");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_does_not_affect_others() {
        let mut bus = NotificationBus::new();
        let first = bus.subscribe_key("ns", "a");
        let mut second = bus.subscribe_key("ns", "a");

        drop(first);
        bus.publish_key("ns", "a", &Record::new("a", 7));

        assert_eq!(second.try_recv().unwrap().value, 7);
    }

    #[test]
    fn test_key_channels_are_isolated() {
        let mut bus = NotificationBus::new();
        let mut a = bus.subscribe_key("ns", "a");
        let mut b = bus.subscribe_key("ns", "b");

        bus.publish_key("ns", "b", &Record::new("b", 2));

        assert!(a.try_recv().is_err());
        assert_eq!(b.try_recv().unwrap().key, "b");
    }

    #[test]
    fn test_namespace_channel_carries_destroyed() {
        let mut bus: NotificationBus<i32> = NotificationBus::new();
        let mut rx = bus.subscribe_namespace("ns");

        bus.publish_namespace("ns", &NamespaceEvent::Destroyed);

        assert!(rx.try_recv().unwrap().is_destroyed());
    }

    #[test]
    fn test_namespace_delta_order_preserved_per_subscriber() {
        let mut bus = NotificationBus::new();
        let mut rx = bus.subscribe_key("ns", "a");

        let mut record = Record::new("a", 1);
        bus.publish_key("ns", "a", &record);
        record.update(2);
        bus.publish_key("ns", "a", &record);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.value, 1);
        assert_eq!(first.change, ChangeKind::Added);
        assert_eq!(second.value, 2);
        assert_eq!(second.change, ChangeKind::Updated);
    }

    #[test]
    fn test_clear_disconnects_subscribers() {
        let mut bus: NotificationBus<i32> = NotificationBus::new();
        let mut rx = bus.subscribe_namespace("ns");

        bus.clear();

        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert_eq!(bus.namespace_channel_count(), 0);
    }
}
