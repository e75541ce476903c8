//! Lifecycle event bus.
//!
//! Observers subscribe to a broadcast channel rather than the coordinator
//! inheriting event-emission machinery; the coordinator owns the bus and
//! notifies through it.

use tokio::sync::broadcast;

/// Notification emitted by the lifecycle coordinator.
///
/// All variants are fire-and-forget; only `Error` carries a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Listener bound and accepting traffic.
    Online,
    /// An externally-triggered stop has begun (before the offline report).
    Stopping,
    /// The drain has started; no further keep-alive requests will be served.
    Exiting,
    /// Asynchronous transport error; does not alter lifecycle state.
    Error(String),
}

/// Subscribe/notify registry for lifecycle observers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Notify all subscribers. Lagging or absent subscribers are not an error.
    pub fn notify(&self, event: LifecycleEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_reaches_subscriber() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.notify(LifecycleEvent::Online);

        assert_eq!(rx.try_recv().unwrap(), LifecycleEvent::Online);
    }

    #[tokio::test]
    async fn notify_reaches_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.notify(LifecycleEvent::Error("boom".to_string()));

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn notify_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.notify(LifecycleEvent::Exiting);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
