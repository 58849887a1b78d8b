//! HistoryLoader: fetch the stored conversation once per session start
//!
//! A 403 means the service forgot this device: the identity is replaced,
//! registered, and the fetch retried exactly once. Every other failure
//! degrades to an empty history.

use super::types::ConversationTurn;
use crate::identity::{DeviceIdentity, IdentityStore};
use crate::service::{ChatService, Registrar, ServiceError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns to render, plus the identity in force after the load
#[derive(Debug, Clone)]
pub struct LoadedHistory {
    pub turns: Vec<ConversationTurn>,
    pub identity: DeviceIdentity,
}

pub struct HistoryLoader {
    service: Arc<dyn ChatService>,
    registrar: Registrar,
    identities: IdentityStore,
}

impl HistoryLoader {
    pub fn new(service: Arc<dyn ChatService>, identities: IdentityStore) -> Self {
        Self {
            registrar: Registrar::new(service.clone()),
            service,
            identities,
        }
    }

    pub async fn load(&self, identity: DeviceIdentity) -> LoadedHistory {
        match self.service.fetch_history(&identity).await {
            Ok(turns) => {
                debug!(turns = turns.len(), "History loaded");
                LoadedHistory { turns, identity }
            }
            Err(ServiceError::Forbidden) => {
                info!(client_id = %identity.id, "Identity rejected, regenerating");
                self.reload_with_new_identity(identity).await
            }
            Err(e) => {
                warn!("History unavailable: {}", e);
                LoadedHistory {
                    turns: Vec::new(),
                    identity,
                }
            }
        }
    }

    async fn reload_with_new_identity(&self, rejected: DeviceIdentity) -> LoadedHistory {
        let fresh = match self
            .identities
            .discard()
            .and_then(|_| self.identities.ensure_identity())
        {
            Ok(ensured) => ensured.identity,
            Err(e) => {
                warn!("Could not replace rejected identity: {}", e);
                return LoadedHistory {
                    turns: Vec::new(),
                    identity: rejected,
                };
            }
        };

        // Best effort: the retried fetch reports whether it took
        let _ = self.registrar.register(&fresh).await;

        let turns = match self.service.fetch_history(&fresh).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!("History retry failed, starting empty: {}", e);
                Vec::new()
            }
        };
        LoadedHistory {
            turns,
            identity: fresh,
        }
    }
}
