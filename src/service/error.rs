//! Errors of the synchronous HTTP calls

use thiserror::Error;

/// Failure of one request/response exchange with the assistant service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service does not recognize the presented device identity (HTTP 403)
    #[error("device identity rejected by the service")]
    Forbidden,
    /// Any other non-success status
    #[error("Error: {code} {reason}")]
    Status { code: u16, reason: String },
    /// Connection refused, timeout, network drop
    #[error("transport failure: {0}")]
    Transport(String),
    /// A success response whose body could not be decoded
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl ServiceError {
    pub fn status(code: u16, reason: impl Into<String>) -> Self {
        ServiceError::Status {
            code,
            reason: reason.into(),
        }
    }

    /// Text of the error turn shown to the user when a submit fails
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Status { code, reason } if reason.is_empty() => {
                format!("Error: {}", code)
            }
            ServiceError::Status { .. } => self.to_string(),
            ServiceError::Forbidden => "Error: 403 Forbidden".to_string(),
            ServiceError::Transport(_) | ServiceError::Decode(_) => {
                "Failed to send message.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}
