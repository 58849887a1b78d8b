//! Persistent push channel
//!
//! Provides:
//! - `ConnectionManager`: connect / detect close / reconnect with backoff
//! - `Backoff` + `ReconnectConfig`: the reconnect delay policy
//! - `Connector` + `FrameStream`: transport seam, `WsConnector` for WebSockets
//! - `InboundFrame`: parsing of pushed JSON frames

pub mod backoff;
pub mod frame;
pub mod manager;
#[cfg(test)]
pub(crate) mod mock;
pub mod transport;

pub use backoff::{Backoff, ReconnectConfig};
pub use frame::InboundFrame;
pub use manager::ConnectionManager;
pub use transport::{push_endpoint, ConnectError, Connector, FrameStream, WsConnector};
