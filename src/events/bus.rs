//! Event bus for broadcasting connection lifecycle events

use super::ConnectionEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 64;

/// Event bus that distributes ConnectionEvents via `tokio::sync::broadcast`
///
/// Fire-and-forget: emitting never blocks, never panics.
/// If no subscribers are connected, events are silently dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ConnectionEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to receive connection events
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn emit(&self, event: ConnectionEvent) {
        let state = event.state;
        if let Ok(n) = self.sender.send(event) {
            debug!(state = %state, subscribers = n, "ConnectionEvent emitted");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ConnectionState;

    #[test]
    fn test_emit_without_subscriber_no_panic() {
        let bus = EventBus::default();
        bus.emit(ConnectionEvent::new(ConnectionState::Connecting));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_emit_with_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(ConnectionEvent::new(ConnectionState::Closed).with_reconnect_delay(3000));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.state, ConnectionState::Closed);
        assert_eq!(event.reconnect_delay_ms, Some(3000));
    }

    #[test]
    fn test_clone_shares_channel() {
        let bus = EventBus::default();
        let bus2 = bus.clone();
        let mut rx = bus.subscribe();

        bus2.emit(ConnectionEvent::new(ConnectionState::Open));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.state, ConnectionState::Open);
    }
}
