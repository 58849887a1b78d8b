//! Inbound push-channel frames

use serde::Deserialize;

/// Frame shapes the client understands
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireFrame {
    ChatResponse { content: String },
}

/// A parsed inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// `{"type": "chat_response", "content": "..."}`
    ChatResponse { content: String },
    /// Anything else: other JSON shapes, non-JSON text
    Unrecognized,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<WireFrame>(text) {
            Ok(WireFrame::ChatResponse { content }) => InboundFrame::ChatResponse { content },
            Err(_) => InboundFrame::Unrecognized,
        }
    }
}
