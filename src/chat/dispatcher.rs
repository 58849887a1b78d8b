//! ReplyDispatcher: first reply wins
//!
//! A question can be answered twice: once over the push channel and once
//! inline in the submit response. The dispatcher owns the single
//! `PendingExchange` and renders whichever reply arrives first; the other
//! one finds the exchange cleared and is dropped.
//!
//! When the submit request came back empty and the push channel closed while
//! the question was open, no reply can arrive any more. The exchange is then
//! closed with a notice so the next question is accepted.
//!
//! The dispatcher is not `Sync` and takes `&mut self` everywhere: it is owned
//! by exactly one task, which serializes push and inline deliveries.

use super::types::{
    ConversationTurn, DispatchStats, PendingExchange, ReplySource, Role, SubmitOutcome,
};
use crate::render::Renderer;
use crate::service::ServiceError;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Shown in place of a reply the push channel dropped
pub const LOST_REPLY_NOTICE: &str = "No reply received, the connection dropped. Please ask again.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Only one question may be open at a time
    #[error("a question is already waiting for its reply")]
    ExchangeInFlight,
    /// The session event loop has stopped
    #[error("chat session is closed")]
    SessionClosed,
}

pub struct ReplyDispatcher<R: Renderer> {
    renderer: R,
    pending: Option<PendingExchange>,
    loading: bool,
    stats: DispatchStats,
}

impl<R: Renderer> ReplyDispatcher<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            pending: None,
            loading: false,
            stats: DispatchStats::default(),
        }
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.pending
            .as_ref()
            .map(|p| p.awaiting_reply)
            .unwrap_or(false)
    }

    pub fn pending(&self) -> Option<&PendingExchange> {
        self.pending.as_ref()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Render previously stored turns, in order
    pub fn render_history(&mut self, turns: &[ConversationTurn]) {
        for turn in turns {
            self.renderer.append_turn(turn.role, &turn.content);
        }
    }

    /// Open an exchange for `question`.
    ///
    /// Appends the user turn and shows the loading indicator. The caller
    /// sends the request only on `Started`.
    pub fn begin(&mut self, question: &str) -> Result<SubmitOutcome, DispatchError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        if self.is_awaiting_reply() {
            debug!("Submit rejected, exchange already open");
            return Err(DispatchError::ExchangeInFlight);
        }

        self.renderer.append_turn(Role::User, question);
        self.show_loading();
        self.pending = Some(PendingExchange::new(question));
        Ok(SubmitOutcome::Started)
    }

    /// Deliver a reply pushed over the persistent channel
    pub fn accept_push(&mut self, content: &str) -> bool {
        self.accept(content, ReplySource::Push)
    }

    /// Deliver the outcome of the submit request.
    ///
    /// `Ok(None)` (no inline content) keeps waiting for the push. A failure
    /// closes the exchange with an error turn, unless the push already
    /// answered it.
    pub fn accept_inline(&mut self, result: Result<Option<String>, ServiceError>) -> bool {
        self.stats.responses += 1;
        match result {
            Ok(Some(content)) if !content.is_empty() => {
                self.accept(&content, ReplySource::Inline)
            }
            Ok(_) => {
                debug!(
                    awaiting = self.is_awaiting_reply(),
                    "Submit returned no inline reply"
                );
                if let Some(exchange) = self.pending.as_mut() {
                    exchange.inline_settled = true;
                }
                self.release_if_lost()
            }
            Err(e) => self.fail(&e),
        }
    }

    /// The push channel closed. A reply pushed on it before now has already
    /// been delivered.
    pub fn push_channel_closed(&mut self) -> bool {
        if let Some(exchange) = self.pending.as_mut() {
            exchange.push_interrupted = true;
        }
        self.release_if_lost()
    }

    fn release_if_lost(&mut self) -> bool {
        match self.pending.take() {
            Some(exchange) if exchange.is_lost() => {
                warn!(question = %exchange.question_text, "Reply lost with the push channel");
            }
            other => {
                self.pending = other;
                return false;
            }
        }
        self.hide_loading();
        self.renderer.append_turn(Role::Assistant, LOST_REPLY_NOTICE);
        self.stats.lost += 1;
        true
    }

    fn accept(&mut self, content: &str, source: ReplySource) -> bool {
        match self.pending.take() {
            Some(exchange) if exchange.awaiting_reply => {
                self.hide_loading();
                self.renderer.append_turn(Role::Assistant, content);
                self.stats.accepted += 1;
                debug!(%source, question = %exchange.question_text, "Reply accepted");
                true
            }
            _ => {
                self.stats.suppressed += 1;
                debug!(%source, "Reply dropped, no question waiting");
                false
            }
        }
    }

    fn fail(&mut self, error: &ServiceError) -> bool {
        match self.pending.take() {
            Some(exchange) if exchange.awaiting_reply => {
                warn!(question = %exchange.question_text, "Submit failed: {}", error);
                self.hide_loading();
                self.renderer
                    .append_turn(Role::Assistant, &error.user_message());
                self.stats.failed += 1;
                true
            }
            _ => {
                info!("Submit failed after the reply was already shown: {}", error);
                false
            }
        }
    }

    fn show_loading(&mut self) {
        if !self.loading {
            self.loading = true;
            self.renderer.show_loading();
        }
    }

    fn hide_loading(&mut self) {
        if self.loading {
            self.loading = false;
            self.renderer.hide_loading();
        }
    }
}
