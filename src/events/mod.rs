//! Connection event system
//!
//! This module provides:
//! - `ConnectionState`: lifecycle states of the persistent push channel
//! - `ConnectionEvent`: one state transition, with the scheduled reconnect delay
//! - `EventBus`: broadcast channel for distributing events to the session loop

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{ConnectionEvent, ConnectionState};
