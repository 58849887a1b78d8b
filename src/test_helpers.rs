//! Test helper factories and mock state builders
//!
//! Provides convenience functions for creating test objects with sensible defaults,
//! and helpers for building a mock ClientState.
#![allow(dead_code)]

use crate::chat::types::ConversationTurn;
use crate::connection::mock::FakeConnector;
use crate::connection::ReconnectConfig;
use crate::identity::{DeviceIdentity, IdentityStore, MemoryStore};
use crate::service::mock::MockChatService;
use crate::{ClientState, Config};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Mock state builders
// ============================================================================

/// Reconnect timing short enough for real-time tests
pub fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        initial_ms: 20,
        factor: 1.5,
        max_ms: 200,
    }
}

/// Create a ClientState over the given mocks with an in-memory identity store
pub fn mock_client_state(
    service: Arc<MockChatService>,
    connector: Arc<FakeConnector>,
) -> ClientState {
    ClientState {
        service,
        identities: IdentityStore::new(Arc::new(MemoryStore::new())),
        connector,
        config: Arc::new(Config {
            server_url: "http://mock:8000".to_string(),
            push_url: None,
            request_timeout: None,
            reconnect: fast_reconnect(),
            identity_path: "/tmp/mock-identity.json".into(),
        }),
    }
}

// ============================================================================
// Factories
// ============================================================================

pub fn test_identity() -> DeviceIdentity {
    DeviceIdentity {
        id: "device_test".to_string(),
        secret: "test-secret".to_string(),
    }
}

pub fn test_history() -> Vec<ConversationTurn> {
    vec![
        ConversationTurn::user("What is Rust?"),
        ConversationTurn::assistant("A systems programming language."),
    ]
}

/// `chat_response` frame carrying `content`
pub fn chat_response_frame(content: &str) -> String {
    serde_json::json!({ "type": "chat_response", "content": content }).to_string()
}

/// Push a `chat_response` frame on the fake channel
pub fn push_frame(connector: &FakeConnector, content: &str) -> bool {
    connector.push(&chat_response_frame(content))
}

// ============================================================================
// Waiting
// ============================================================================

/// Poll `condition` until it holds; panics after about two seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}
