//! Device identity: durable id + secret presented on every outbound call
//!
//! Provides:
//! - `KeyValueStore`: the durable key/value persistence seam
//! - `FileStore`: JSON file implementation surviving process restarts
//! - `MemoryStore`: in-memory implementation for tests and ephemeral sessions
//! - `IdentityStore`: creates the identity once and hands it out afterwards

mod file_store;
mod memory;
mod store;

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use store::{DeviceIdentity, EnsuredIdentity, IdentityStore, CLIENT_ID_KEY, CLIENT_SECRET_KEY};

use thiserror::Error;

/// Failure of the persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("identity storage is corrupt: {0}")]
    Corrupt(String),
}

/// Durable key/value storage surviving process restarts.
///
/// Each call is a single atomic operation from the caller's perspective.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several keys together. Durable implementations override this so
    /// either all of `entries` or none of them are stored.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
