//! Trait abstraction for the assistant service's synchronous API

use super::error::ServiceError;
use crate::chat::types::ConversationTurn;
use crate::identity::DeviceIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of a successful registration, when the service sends one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Trait abstracting every request/response call made to the assistant service.
///
/// `HttpChatService` is the production implementation; `mock::MockChatService`
/// scripts responses for tests.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Present the identity to the service. Idempotent on the server side.
    async fn register(&self, identity: &DeviceIdentity) -> Result<RegistrationAck, ServiceError>;

    /// Fetch the stored conversation in chronological order.
    ///
    /// Returns `ServiceError::Forbidden` when the identity is unknown.
    async fn fetch_history(
        &self,
        identity: &DeviceIdentity,
    ) -> Result<Vec<ConversationTurn>, ServiceError>;

    /// Submit a question. `Ok(Some(reply))` when the service answered inline,
    /// `Ok(None)` when the answer will only arrive over the push channel.
    async fn submit(
        &self,
        question: &str,
        identity: &DeviceIdentity,
    ) -> Result<Option<String>, ServiceError>;

    /// Ask whether the service knows this identity
    async fn verify(&self, identity: &DeviceIdentity) -> Result<bool, ServiceError>;
}
