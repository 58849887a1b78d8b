//! Best-effort device registration
//!
//! Registration failures are logged and absorbed: a later call gated on the
//! identity retries naturally, and nothing here may reach the user.

use super::error::ServiceError;
use super::traits::{ChatService, RegistrationAck};
use crate::identity::DeviceIdentity;
use std::sync::Arc;
use tracing::{info, warn};

/// Presents device identities to the service
#[derive(Clone)]
pub struct Registrar {
    service: Arc<dyn ChatService>,
}

impl Registrar {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self { service }
    }

    /// Register `identity`. Failures are logged here; callers may ignore the result.
    pub async fn register(
        &self,
        identity: &DeviceIdentity,
    ) -> Result<RegistrationAck, ServiceError> {
        match self.service.register(identity).await {
            Ok(ack) => {
                info!(client_id = %identity.id, "Device registration accepted");
                Ok(ack)
            }
            Err(e) => {
                warn!(client_id = %identity.id, "Registration skipped: {}", e);
                Err(e)
            }
        }
    }
}
