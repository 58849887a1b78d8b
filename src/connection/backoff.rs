//! Reconnect backoff policy

use anyhow::{ensure, Result};
use serde::Deserialize;
use std::time::Duration;

/// Reconnect timing, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay scheduled after the first close, and again after every successful open
    pub initial_ms: u64,
    /// Growth factor applied after each consecutive close
    pub factor: f64,
    /// Upper bound of the delay
    pub max_ms: u64,
}

impl ReconnectConfig {
    /// Reject timings that would shrink, stall or overflow the delay
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.factor.is_finite() && self.factor >= 1.0,
            "reconnect factor must be a finite number >= 1.0, got {}",
            self.factor
        );
        ensure!(self.initial_ms > 0, "reconnect initial_ms must be positive");
        ensure!(
            self.initial_ms <= self.max_ms,
            "reconnect initial_ms ({}) exceeds max_ms ({})",
            self.initial_ms,
            self.max_ms
        );
        Ok(())
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_ms: 2000,
            factor: 1.5,
            max_ms: 30000,
        }
    }
}

/// Growing delay between reconnection attempts.
///
/// After N consecutive closes with no open in between, the Nth scheduled delay
/// is `min(initial * factor^(N-1), max)`. Fractional milliseconds are kept so
/// the sequence does not drift from that formula.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    current_ms: f64,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            current_ms: config.initial_ms as f64,
        }
    }

    /// Delay to wait before the next attempt; grows the following one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_ms;
        self.current_ms = (self.current_ms * self.config.factor).min(self.config.max_ms as f64);
        Duration::from_secs_f64(delay / 1000.0)
    }

    /// Back to the initial delay (called on reaching `Open`)
    pub fn reset(&mut self) {
        self.current_ms = self.config.initial_ms as f64;
    }
}
