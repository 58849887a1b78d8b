//! Connection lifecycle event types

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the persistent push channel
///
/// `Idle` is the initial state. `Closed` is never terminal: the connection
/// manager always schedules a reconnect from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    /// True while a channel exists or is being established
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A state transition of the persistent channel
///
/// Must be Clone for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionEvent {
    /// The state just entered
    pub state: ConnectionState,
    /// Reconnect delay scheduled on entering `Closed`, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl ConnectionEvent {
    /// Create a new ConnectionEvent with the current timestamp
    pub fn new(state: ConnectionState) -> Self {
        Self {
            state,
            reconnect_delay_ms: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Attach the scheduled reconnect delay
    pub fn with_reconnect_delay(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = Some(delay_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_snake_case() {
        assert_eq!(
            serde_json::to_string(&ConnectionState::Connecting).unwrap(),
            "\"connecting\""
        );
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }

    #[test]
    fn test_is_active() {
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Open.is_active());
        assert!(!ConnectionState::Idle.is_active());
        assert!(!ConnectionState::Closed.is_active());
    }

    #[test]
    fn test_event_delay_omitted_when_absent() {
        let event = ConnectionEvent::new(ConnectionState::Open);
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("reconnect_delay_ms"));

        let event = ConnectionEvent::new(ConnectionState::Closed).with_reconnect_delay(2000);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"reconnect_delay_ms\":2000"));
    }
}
