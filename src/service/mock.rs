//! Scripted mock implementation of ChatService for testing.
//!
//! Each call pops the next scripted result for its endpoint; when the script
//! is empty a benign default is returned (registration ok, empty history,
//! no inline reply, identity known). Every call is recorded.
//! Conditionally compiled with `#[cfg(test)]`.

use super::error::ServiceError;
use super::traits::{ChatService, RegistrationAck};
use crate::chat::types::ConversationTurn;
use crate::identity::DeviceIdentity;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type Script<T> = Mutex<VecDeque<Result<T, ServiceError>>>;

/// Scripted mock implementation of ChatService for testing.
#[derive(Default)]
pub struct MockChatService {
    register_script: Script<RegistrationAck>,
    history_script: Script<Vec<ConversationTurn>>,
    submit_script: Script<Option<String>>,

    registered: Mutex<Vec<String>>,
    history_requests: Mutex<Vec<String>>,
    submitted: Mutex<Vec<(String, String)>>,

    /// When set, each submit waits for one permit before answering
    submit_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockChatService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_register(&self, result: Result<RegistrationAck, ServiceError>) {
        self.register_script.lock().unwrap().push_back(result);
    }

    pub fn push_history(&self, result: Result<Vec<ConversationTurn>, ServiceError>) {
        self.history_script.lock().unwrap().push_back(result);
    }

    pub fn push_submit(&self, result: Result<Option<String>, ServiceError>) {
        self.submit_script.lock().unwrap().push_back(result);
    }

    /// Make submits block until the returned `Notify` hands out a permit.
    pub fn hold_submits(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.submit_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn register_calls(&self) -> usize {
        self.registered.lock().unwrap().len()
    }

    /// Client ids presented to `register`, in call order
    pub fn registered_ids(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }

    pub fn history_calls(&self) -> usize {
        self.history_requests.lock().unwrap().len()
    }

    /// Client ids presented to `fetch_history`, in call order
    pub fn history_ids(&self) -> Vec<String> {
        self.history_requests.lock().unwrap().clone()
    }

    /// `(client_id, question)` pairs presented to `submit`, in call order
    pub fn submitted(&self) -> Vec<(String, String)> {
        self.submitted.lock().unwrap().clone()
    }

    fn next<T>(script: &Script<T>, default: impl FnOnce() -> T) -> Result<T, ServiceError> {
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(default()))
    }
}

#[async_trait]
impl ChatService for MockChatService {
    async fn register(&self, identity: &DeviceIdentity) -> Result<RegistrationAck, ServiceError> {
        self.registered.lock().unwrap().push(identity.id.clone());
        Self::next(&self.register_script, RegistrationAck::default)
    }

    async fn fetch_history(
        &self,
        identity: &DeviceIdentity,
    ) -> Result<Vec<ConversationTurn>, ServiceError> {
        self.history_requests.lock().unwrap().push(identity.id.clone());
        Self::next(&self.history_script, Vec::new)
    }

    async fn submit(
        &self,
        question: &str,
        identity: &DeviceIdentity,
    ) -> Result<Option<String>, ServiceError> {
        self.submitted
            .lock()
            .unwrap()
            .push((identity.id.clone(), question.to_string()));

        let gate = self.submit_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Self::next(&self.submit_script, || None)
    }

    async fn verify(&self, _identity: &DeviceIdentity) -> Result<bool, ServiceError> {
        Ok(true)
    }
}
