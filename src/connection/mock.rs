//! Fake push channel for testing.
//!
//! `FakeConnector` hands out in-memory channels. The test side pushes frames
//! into the current channel, closes it to simulate a server drop, and can
//! script connect failures. Conditionally compiled with `#[cfg(test)]`.

use super::transport::{ConnectError, Connector, FrameStream};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

pub struct FakeConnector {
    /// Sender side of the most recently opened channel
    current: Mutex<Option<mpsc::UnboundedSender<String>>>,
    failures_left: AtomicUsize,
    attempts: watch::Sender<usize>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            failures_left: AtomicUsize::new(0),
            attempts: watch::channel(0).0,
        }
    }

    /// Fail the next `n` connect attempts
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Connect attempts so far, failed ones included
    pub fn connect_count(&self) -> usize {
        *self.attempts.borrow()
    }

    /// Wait until at least `n` connect attempts have been made
    pub async fn wait_for_connects(&self, n: usize) {
        let mut rx = self.attempts.subscribe();
        // The sender lives as long as self, so this cannot fail
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Deliver a frame on the current channel. Returns false if none is open.
    pub fn push(&self, frame: &str) -> bool {
        match self.current.lock().unwrap().as_ref() {
            Some(tx) => tx.send(frame.to_string()).is_ok(),
            None => false,
        }
    }

    /// Drop the current channel as if the server closed it
    pub fn close_current(&self) {
        self.current.lock().unwrap().take();
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn FrameStream>, ConnectError> {
        self.attempts.send_modify(|count| *count += 1);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ConnectError::Handshake("scripted failure".into()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.current.lock().unwrap() = Some(tx);
        Ok(Box::new(FakeStream { rx }))
    }
}

struct FakeStream {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl FrameStream for FakeStream {
    async fn next_frame(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
