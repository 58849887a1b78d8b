//! ConnectionManager: lifecycle of the persistent push channel
//!
//! States: `Idle → Connecting → Open → Closed → Connecting → …`
//!
//! - A close (or a failed attempt) schedules a reconnect after the current
//!   backoff delay; reaching `Open` resets the backoff.
//! - `connect` is a no-op while a channel is `Connecting` or `Open`, so two
//!   channels never coexist.
//! - `chat_response` frames go to the reply handler; every other frame is
//!   logged and dropped.
//! - There is no per-message acknowledgement: a reply lost while the channel
//!   was down is not recovered here.

use super::backoff::{Backoff, ReconnectConfig};
use super::frame::InboundFrame;
use super::transport::{Connector, FrameStream};
use crate::events::{ConnectionEvent, ConnectionState, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives the content of every `chat_response` frame
pub type ReplyHandler = Box<dyn Fn(String) + Send + Sync>;

/// Owner of the persistent push channel
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    state: ConnectionState,
    backoff: Backoff,
    events: EventBus,
    on_reply: ReplyHandler,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        reconnect: ReconnectConfig,
        events: EventBus,
        on_reply: impl Fn(String) + Send + Sync + 'static,
    ) -> Self {
        Self {
            connector,
            state: ConnectionState::Idle,
            backoff: Backoff::new(reconnect),
            events,
            on_reply: Box::new(on_reply),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, state: ConnectionState, reconnect_delay: Option<Duration>) {
        debug!(from = %self.state, to = %state, "Connection state change");
        self.state = state;
        let mut event = ConnectionEvent::new(state);
        if let Some(delay) = reconnect_delay {
            event = event.with_reconnect_delay(delay.as_millis() as u64);
        }
        self.events.emit(event);
    }

    /// Attempt to open the channel.
    ///
    /// Returns `None` without touching the connector when a channel is already
    /// `Connecting` or `Open`, and `None` after a failed attempt (the caller
    /// then treats the attempt as a close).
    pub async fn connect(&mut self) -> Option<Box<dyn FrameStream>> {
        if self.state.is_active() {
            debug!(state = %self.state, "Connect skipped, channel already active");
            return None;
        }

        self.transition(ConnectionState::Connecting, None);
        match self.connector.connect().await {
            Ok(stream) => {
                self.backoff.reset();
                self.transition(ConnectionState::Open, None);
                info!("Push channel connected");
                Some(stream)
            }
            Err(e) => {
                warn!("Push channel connect failed: {}", e);
                None
            }
        }
    }

    /// Record a close and return the delay before the next attempt
    pub fn on_closed(&mut self) -> Duration {
        let delay = self.backoff.next_delay();
        self.transition(ConnectionState::Closed, Some(delay));
        info!(
            delay_ms = delay.as_millis() as u64,
            "Push channel closed, reconnect scheduled"
        );
        delay
    }

    fn handle_frame(&self, text: &str) {
        match InboundFrame::parse(text) {
            InboundFrame::ChatResponse { content } => {
                debug!(len = content.len(), "chat_response received");
                (self.on_reply)(content);
            }
            InboundFrame::Unrecognized => {
                debug!(frame = %text, "Dropping unrecognized push frame");
            }
        }
    }

    /// Deliver frames until the channel closes or `cancel` fires.
    /// Returns true if cancelled.
    async fn pump(
        &mut self,
        stream: &mut Box<dyn FrameStream>,
        cancel: &CancellationToken,
    ) -> bool {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return true,
                frame = stream.next_frame() => match frame {
                    Some(text) => self.handle_frame(&text),
                    None => return false,
                },
            }
        }
    }

    /// Keep the channel up until `cancel` fires. Retries forever.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let attempt = tokio::select! {
                _ = cancel.cancelled() => break,
                stream = self.connect() => stream,
            };

            if let Some(mut stream) = attempt {
                if self.pump(&mut stream, &cancel).await {
                    break;
                }
            }

            let delay = self.on_closed();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if self.state != ConnectionState::Closed {
            self.transition(ConnectionState::Closed, None);
        }
        debug!("Connection manager stopped");
    }
}
