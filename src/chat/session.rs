//! ChatSession: wires identity, history, push channel and dispatcher together
//!
//! One task owns the `ReplyDispatcher` and drains a single queue of
//! `SessionEvent`s in arrival order. Submit requests run in spawned tasks that
//! post their result back to that queue, so push frames and user input keep
//! flowing while a request is in flight.

use super::dispatcher::{DispatchError, ReplyDispatcher};
use super::history::HistoryLoader;
use super::types::{DispatchStats, SubmitOutcome};
use crate::connection::ConnectionManager;
use crate::events::{ConnectionEvent, ConnectionState, EventBus};
use crate::identity::DeviceIdentity;
use crate::render::Renderer;
use crate::service::{ChatService, Registrar, ServiceError};
use crate::ClientState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Everything the session loop reacts to
enum SessionEvent {
    Submit {
        question: String,
        reply: oneshot::Sender<Result<SubmitOutcome, DispatchError>>,
    },
    Inline(Result<Option<String>, ServiceError>),
    Push(String),
    Connection(ConnectionEvent),
}

/// Observable state of a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub awaiting_reply: bool,
    pub stats: DispatchStats,
    pub connection: ConnectionState,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            awaiting_reply: false,
            stats: DispatchStats::default(),
            connection: ConnectionState::Idle,
        }
    }
}

/// A running chat session
pub struct ChatSession {
    tx: mpsc::UnboundedSender<SessionEvent>,
    snapshot: watch::Receiver<SessionSnapshot>,
    identity: DeviceIdentity,
    events: EventBus,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ChatSession {
    /// Start a session: ensure the identity, register it if new, render the
    /// stored history, then open the push channel and the event loop.
    pub async fn start<R: Renderer + 'static>(state: &ClientState, renderer: R) -> Result<Self> {
        let ensured = state
            .identities
            .ensure_identity()
            .context("Failed to load device identity")?;
        if ensured.created {
            // Best effort, failures are logged by the registrar
            let _ = Registrar::new(state.service.clone())
                .register(&ensured.identity)
                .await;
        }

        let loader = HistoryLoader::new(state.service.clone(), state.identities.clone());
        let loaded = loader.load(ensured.identity).await;
        let identity = loaded.identity;

        let mut dispatcher = ReplyDispatcher::new(renderer);
        dispatcher.render_history(&loaded.turns);

        let cancel = CancellationToken::new();
        let events = EventBus::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(SessionSnapshot::initial());

        // Subscribe before the manager starts so the first transition is seen
        let forwarder = tokio::spawn(forward_connection_events(
            events.subscribe(),
            tx.clone(),
            cancel.clone(),
        ));

        let push_tx = tx.clone();
        let manager = ConnectionManager::new(
            state.connector.clone(),
            state.config.reconnect,
            events.clone(),
            move |content| {
                // Only fails once the loop is gone
                let _ = push_tx.send(SessionEvent::Push(content));
            },
        );
        let connection = tokio::spawn(manager.run(cancel.clone()));

        let event_loop = SessionLoop {
            dispatcher,
            service: state.service.clone(),
            identity: identity.clone(),
            tx: tx.clone(),
            snapshot: snapshot_tx,
        };
        let looper = tokio::spawn(event_loop.run(rx, cancel.clone()));

        info!(client_id = %identity.id, history = loaded.turns.len(), "Chat session started");

        Ok(Self {
            tx,
            snapshot,
            identity,
            events,
            cancel,
            tasks: vec![forwarder, connection, looper],
        })
    }

    /// Submit a question. Resolves once the question is shown, not when the
    /// reply arrives.
    pub async fn submit(&self, question: &str) -> Result<SubmitOutcome, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionEvent::Submit {
                question: question.to_string(),
                reply,
            })
            .map_err(|_| DispatchError::SessionClosed)?;
        rx.await.map_err(|_| DispatchError::SessionClosed)?
    }

    /// Identity presented on every call of this session
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        *self.snapshot.borrow()
    }

    pub fn awaiting_reply(&self) -> bool {
        self.snapshot().awaiting_reply
    }

    pub fn stats(&self) -> DispatchStats {
        self.snapshot().stats
    }

    /// Wait until the session state satisfies `f`
    pub async fn wait_for(
        &self,
        f: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, DispatchError> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(f)
            .await
            .map_err(|_| DispatchError::SessionClosed)?;
        Ok(*snapshot)
    }

    pub fn subscribe_connection_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Stop the push channel and the event loop
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Session task panicked: {}", e);
                }
            }
        }
        debug!("Chat session stopped");
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn forward_connection_events(
    mut rx: broadcast::Receiver<ConnectionEvent>,
    tx: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => event,
        };
        match event {
            Ok(event) => {
                if tx.send(SessionEvent::Connection(event)).is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(n)) => debug!(skipped = n, "Connection events lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

struct SessionLoop<R: Renderer> {
    dispatcher: ReplyDispatcher<R>,
    service: Arc<dyn ChatService>,
    identity: DeviceIdentity,
    tx: mpsc::UnboundedSender<SessionEvent>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl<R: Renderer> SessionLoop<R> {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<SessionEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle(event);
            self.publish();
        }
        debug!("Session loop stopped");
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Submit { question, reply } => {
                let outcome = self.dispatcher.begin(&question);
                if let Ok(SubmitOutcome::Started) = outcome {
                    self.send_question(question.trim().to_string());
                }
                let _ = reply.send(outcome);
            }
            SessionEvent::Inline(result) => {
                self.dispatcher.accept_inline(result);
            }
            SessionEvent::Push(content) => {
                self.dispatcher.accept_push(&content);
            }
            SessionEvent::Connection(event) => self.on_connection(event),
        }
    }

    fn send_question(&self, question: String) {
        let service = self.service.clone();
        let identity = self.identity.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = service.submit(&question, &identity).await;
            let _ = tx.send(SessionEvent::Inline(result));
        });
    }

    /// Channel drops are not shown; they only matter to an open question
    fn on_connection(&mut self, event: ConnectionEvent) {
        self.snapshot.send_modify(|s| s.connection = event.state);
        if event.state == ConnectionState::Closed {
            self.dispatcher.push_channel_closed();
        }
    }

    fn publish(&self) {
        let awaiting_reply = self.dispatcher.is_awaiting_reply();
        let stats = self.dispatcher.stats();
        self.snapshot.send_modify(|s| {
            s.awaiting_reply = awaiting_reply;
            s.stats = stats;
        });
    }
}
