//! Assistant service: the synchronous request/response side
//!
//! Provides:
//! - `ChatService`: trait over registration, history, submit and verify calls
//! - `HttpChatService`: reqwest implementation of the wire contract
//! - `Registrar`: best-effort registration that never surfaces failures
//! - `ServiceError`: typed failures the callers branch on (403 vs others)

pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod registration;
pub mod traits;

pub use client::HttpChatService;
pub use error::ServiceError;
pub use registration::Registrar;
pub use traits::{ChatService, RegistrationAck};
