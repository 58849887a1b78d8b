//! HTTP implementation of `ChatService`

use super::error::ServiceError;
use super::traits::{ChatService, RegistrationAck};
use crate::chat::types::ConversationTurn;
use crate::identity::DeviceIdentity;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const REGISTER_PATH: &str = "api/register_device";
const HISTORY_PATH: &str = "api/chat/history";
const SUBMIT_PATH: &str = "api/chat";
const VERIFY_PATH: &str = "api/uuid_secret_count";

/// `{client_id, secret}` body of the registration and verify calls
#[derive(Debug, Serialize)]
struct IdentityBody<'a> {
    client_id: &'a str,
    secret: &'a str,
}

/// `{question, client_id, secret}` body of the submit call
#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    question: &'a str,
    client_id: &'a str,
    secret: &'a str,
}

/// Submit response: `response` may be absent or null
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    count: i64,
}

/// Assistant service client over HTTP
#[derive(Debug, Clone)]
pub struct HttpChatService {
    http: Client,
    base_url: Url,
}

impl HttpChatService {
    /// Create a client for the service rooted at `base_url`.
    ///
    /// `timeout` bounds every request; `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        Self::with_client(http, base_url)
    }

    /// Create from an existing reqwest client
    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid service URL: {}", base_url))?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }

    /// Map non-success statuses to errors, passing successful responses through
    fn check_status(resp: Response) -> Result<Response, ServiceError> {
        let status = resp.status();
        if status == StatusCode::FORBIDDEN {
            return Err(ServiceError::Forbidden);
        }
        if !status.is_success() {
            return Err(ServiceError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }
        Ok(resp)
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn register(&self, identity: &DeviceIdentity) -> Result<RegistrationAck, ServiceError> {
        let resp = self
            .http
            .post(self.endpoint(REGISTER_PATH)?)
            .json(&IdentityBody {
                client_id: &identity.id,
                secret: &identity.secret,
            })
            .send()
            .await?;
        let resp = Self::check_status(resp)?;

        // Any 2xx is a success, whatever the body says
        let ack = resp.json::<RegistrationAck>().await.unwrap_or_default();
        debug!(client_id = %identity.id, status = ?ack.status, "Device registered");
        Ok(ack)
    }

    async fn fetch_history(
        &self,
        identity: &DeviceIdentity,
    ) -> Result<Vec<ConversationTurn>, ServiceError> {
        let resp = self
            .http
            .get(self.endpoint(HISTORY_PATH)?)
            .query(&[
                ("client_id", identity.id.as_str()),
                ("secret", identity.secret.as_str()),
            ])
            .send()
            .await?;
        let resp = Self::check_status(resp)?;

        let entries: Vec<serde_json::Value> = resp.json().await?;
        let total = entries.len();
        let turns: Vec<ConversationTurn> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(turn) => Some(turn),
                Err(e) => {
                    warn!("Skipping unreadable history entry: {}", e);
                    None
                }
            })
            .collect();
        debug!(turns = turns.len(), skipped = total - turns.len(), "History fetched");
        Ok(turns)
    }

    async fn submit(
        &self,
        question: &str,
        identity: &DeviceIdentity,
    ) -> Result<Option<String>, ServiceError> {
        let resp = self
            .http
            .post(self.endpoint(SUBMIT_PATH)?)
            .json(&SubmitBody {
                question,
                client_id: &identity.id,
                secret: &identity.secret,
            })
            .send()
            .await?;
        let resp = Self::check_status(resp)?;

        // The request was accepted; an unreadable body only means no inline reply
        match resp.json::<SubmitResponse>().await {
            Ok(body) => Ok(body.response.filter(|r| !r.is_empty())),
            Err(e) => {
                warn!("Submit succeeded but the response body was unreadable: {}", e);
                Ok(None)
            }
        }
    }

    async fn verify(&self, identity: &DeviceIdentity) -> Result<bool, ServiceError> {
        let resp = self
            .http
            .post(self.endpoint(VERIFY_PATH)?)
            .json(&IdentityBody {
                client_id: &identity.id,
                secret: &identity.secret,
            })
            .send()
            .await?;
        let resp = Self::check_status(resp)?;
        let body: VerifyResponse = resp.json().await?;
        Ok(body.count > 0)
    }
}
