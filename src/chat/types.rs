//! Chat types: turns, exchanges and submission outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of the conversation, as stored by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The single question currently waiting for its reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    pub question_text: String,
    pub awaiting_reply: bool,
    /// The submit request completed without inline content
    pub inline_settled: bool,
    /// The push channel closed after the question was sent
    pub push_interrupted: bool,
}

impl PendingExchange {
    pub fn new(question_text: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            awaiting_reply: true,
            inline_settled: false,
            push_interrupted: false,
        }
    }

    /// Neither channel can still deliver the reply
    pub fn is_lost(&self) -> bool {
        self.inline_settled && self.push_interrupted
    }
}

/// Which transport delivered a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Pushed over the persistent channel
    Push,
    /// Carried inline in the submit response
    Inline,
}

impl fmt::Display for ReplySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReplySource::Push => "push",
            ReplySource::Inline => "inline",
        })
    }
}

/// Result of handing a question to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The question was shown and sent; a reply is now awaited
    Started,
    /// The question was empty after trimming; nothing happened
    Ignored,
}

/// Counters kept by the reply dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Replies rendered as the answer to a question
    pub accepted: u64,
    /// Replies dropped because their question was already answered
    pub suppressed: u64,
    /// Synchronous failures rendered as error turns
    pub failed: u64,
    /// Submit requests that have completed, whatever their outcome
    pub responses: u64,
    /// Questions given up on because the push channel dropped their reply
    pub lost: u64,
}
