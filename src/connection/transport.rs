//! Push channel transport
//!
//! Single responsibility: open a channel and yield its text frames.
//! No knowledge of frame semantics, backoff or replies.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use thiserror::Error;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, warn};

/// Path of the push endpoint on the service origin
pub const PUSH_PATH: &str = "/ws";

/// Failure to open the push channel
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid push endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("push channel handshake failed: {0}")]
    Handshake(String),
}

/// An open channel yielding inbound text frames
#[async_trait]
pub trait FrameStream: Send {
    /// Next text frame; `None` once the channel has closed
    async fn next_frame(&mut self) -> Option<String>;
}

/// Opens push channels. Injected into the connection manager so tests can
/// substitute a fake channel.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn FrameStream>, ConnectError>;
}

/// Derive the push endpoint from the service base URL.
///
/// Keeps the origin, mirrors its security (`http → ws`, `https → wss`) and
/// uses the fixed `/ws` path.
pub fn push_endpoint(base_url: &str) -> Result<Url, ConnectError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ConnectError::InvalidEndpoint(format!("{}: {}", base_url, e)))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ConnectError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ConnectError::InvalidEndpoint(format!("cannot use scheme {}", scheme)))?;
    url.set_path(PUSH_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// WebSocket connector
#[derive(Debug, Clone)]
pub struct WsConnector {
    endpoint: Url,
}

impl WsConnector {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }

    /// Connector for an explicit `ws://` / `wss://` URL
    pub fn from_url(url: &str) -> Result<Self, ConnectError> {
        let endpoint =
            Url::parse(url).map_err(|e| ConnectError::InvalidEndpoint(format!("{}: {}", url, e)))?;
        match endpoint.scheme() {
            "ws" | "wss" => Ok(Self::new(endpoint)),
            other => Err(ConnectError::InvalidEndpoint(format!(
                "push URL must be ws:// or wss://, got '{}'",
                other
            ))),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn FrameStream>, ConnectError> {
        debug!(url = %self.endpoint, "Connecting to push channel");
        let (ws, _) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| ConnectError::Handshake(e.to_string()))?;
        Ok(Box::new(WsFrameStream { ws }))
    }
}

/// Text frames of an open WebSocket
struct WsFrameStream {
    ws: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_frame(&mut self) -> Option<String> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(text),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => return Some(text),
                    Err(_) => {
                        debug!("Dropping non-UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(frame = ?frame, "Push channel closed by server");
                    return None;
                }
                // Pong is handled automatically by tungstenite
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!("Push channel error: {}", e);
                    return None;
                }
                None => return None,
            }
        }
    }
}
