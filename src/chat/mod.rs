//! Chat module: one conversation with the assistant service
//!
//! Provides the reply dispatcher that resolves the push/inline race, the
//! history loader with its one-shot identity recovery, and the session that
//! runs both on a single event loop.

pub mod dispatcher;
pub mod history;
pub mod session;
pub mod types;

pub use dispatcher::{DispatchError, ReplyDispatcher};
pub use history::{HistoryLoader, LoadedHistory};
pub use session::{ChatSession, SessionSnapshot};
pub use types::{
    ConversationTurn, DispatchStats, PendingExchange, ReplySource, Role, SubmitOutcome,
};
