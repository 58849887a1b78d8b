//! Assistant Client
//!
//! Terminal client for a conversational assistant service:
//! - Durable device identity, registered with the service on first use
//! - Request/response channel for questions and stored history
//! - Persistent push channel with exponential-backoff reconnects
//! - Reply dispatcher rendering exactly one answer per question, whichever
//!   channel delivers it first

pub mod chat;
pub mod connection;
pub mod events;
pub mod identity;
pub mod render;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use connection::{push_endpoint, ConnectError, Connector, ReconnectConfig, WsConnector};
use identity::{FileStore, IdentityStore};
use reqwest::Url;
use serde::Deserialize;
use service::{ChatService, HttpChatService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "assistant.yaml";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub reconnect: ReconnectConfig,
    pub identity: IdentityYamlConfig,
}

/// Service location section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub url: String,
    /// Push channel endpoint; derived from `url` when absent
    pub push_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".into(),
            push_url: None,
            request_timeout_secs: None,
        }
    }
}

/// Identity persistence section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IdentityYamlConfig {
    pub path: Option<PathBuf>,
}

// ============================================================================
// Runtime config (what the client actually uses)
// ============================================================================

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub push_url: Option<String>,
    /// None means requests never time out
    pub request_timeout: Option<Duration>,
    pub reconnect: ReconnectConfig,
    pub identity_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_yaml(YamlConfig::default())
    }
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries `assistant.yaml` in CWD. A missing file
    /// falls back to env vars / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);
        let mut config = Self::from_yaml(yaml);

        if let Ok(url) = std::env::var("ASSISTANT_URL") {
            config.server_url = url;
        }
        if let Ok(url) = std::env::var("ASSISTANT_PUSH_URL") {
            config.push_url = Some(url);
        }
        if let Some(secs) = env_parse::<u64>("ASSISTANT_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(ms) = env_parse::<u64>("ASSISTANT_RECONNECT_INITIAL_MS")? {
            config.reconnect.initial_ms = ms;
        }
        if let Some(ms) = env_parse::<u64>("ASSISTANT_RECONNECT_MAX_MS")? {
            config.reconnect.max_ms = ms;
        }
        if let Ok(path) = std::env::var("ASSISTANT_IDENTITY_PATH") {
            config.identity_path = PathBuf::from(path);
        }

        config
            .reconnect
            .validate()
            .context("Invalid reconnect configuration")?;

        Ok(config)
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        Self {
            server_url: yaml.server.url,
            push_url: yaml.server.push_url,
            request_timeout: yaml.server.request_timeout_secs.map(Duration::from_secs),
            reconnect: yaml.reconnect,
            identity_path: yaml.identity.path.unwrap_or_else(default_identity_path),
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// Push channel endpoint: the explicit `push_url`, or `/ws` on the service host
    pub fn push_endpoint(&self) -> Result<Url, ConnectError> {
        match &self.push_url {
            Some(url) => WsConnector::from_url(url).map(|c| c.endpoint().clone()),
            None => push_endpoint(&self.server_url),
        }
    }
}

fn env_parse<T>(var: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {:?}", var, value)),
        Err(_) => Ok(None),
    }
}

/// `<config dir>/assistant-client/identity.json`, or the working directory
/// when the platform has no config dir
pub fn default_identity_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("assistant-client")
        .join("identity.json")
}

/// Shared client state
#[derive(Clone)]
pub struct ClientState {
    pub service: Arc<dyn ChatService>,
    pub identities: IdentityStore,
    pub connector: Arc<dyn Connector>,
    pub config: Arc<Config>,
}

impl ClientState {
    /// Create client state with the HTTP service, file-backed identity and
    /// WebSocket push channel
    pub fn new(config: Config) -> Result<Self> {
        config
            .reconnect
            .validate()
            .context("Invalid reconnect configuration")?;
        let service = Arc::new(
            HttpChatService::new(&config.server_url, config.request_timeout)
                .context("Failed to create service client")?,
        );
        let identities = IdentityStore::new(Arc::new(FileStore::new(&config.identity_path)));
        let endpoint = config
            .push_endpoint()
            .context("Failed to derive push channel endpoint")?;
        let connector = Arc::new(WsConnector::new(endpoint));

        Ok(Self {
            service,
            identities,
            connector,
            config: Arc::new(config),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
