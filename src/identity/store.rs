//! Identity store: mints the device identity once and persists it

use super::{KeyValueStore, StoreError};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Storage key of the device id
pub const CLIENT_ID_KEY: &str = "client_id";
/// Storage key of the device secret
pub const CLIENT_SECRET_KEY: &str = "client_secret";

/// Prefix of generated device ids
const DEVICE_ID_PREFIX: &str = "device_";

/// The durable (id, secret) pair presented on every outbound call
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: String,
    pub secret: String,
}

impl DeviceIdentity {
    /// Generate a fresh random identity
    pub fn generate() -> Self {
        Self {
            id: format!("{}{}", DEVICE_ID_PREFIX, Uuid::new_v4()),
            secret: Uuid::new_v4().to_string(),
        }
    }
}

// The secret never reaches logs.
impl fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceIdentity")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Result of `IdentityStore::ensure_identity`
#[derive(Debug, Clone)]
pub struct EnsuredIdentity {
    pub identity: DeviceIdentity,
    /// True when the identity was minted by this call and has never been registered
    pub created: bool,
}

/// Owner of the durable device identity
///
/// Cheap to clone; clones share the same backing store.
#[derive(Clone)]
pub struct IdentityStore {
    kv: Arc<dyn KeyValueStore>,
}

impl IdentityStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The stored identity, if both halves are present
    pub fn current(&self) -> Result<Option<DeviceIdentity>, StoreError> {
        let id = self.kv.get(CLIENT_ID_KEY)?;
        let secret = self.kv.get(CLIENT_SECRET_KEY)?;
        Ok(match (id, secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(DeviceIdentity { id, secret })
            }
            (None, None) => None,
            _ => {
                warn!("Stored device identity is incomplete, a new one will be generated");
                None
            }
        })
    }

    /// Return the durable identity, generating and persisting one if absent.
    ///
    /// The new identity is written before this returns, so no network call can
    /// ever present an identity that a restart would forget.
    pub fn ensure_identity(&self) -> Result<EnsuredIdentity, StoreError> {
        if let Some(identity) = self.current()? {
            return Ok(EnsuredIdentity {
                identity,
                created: false,
            });
        }

        let identity = DeviceIdentity::generate();
        self.kv.set_many(&[
            (CLIENT_ID_KEY, identity.id.as_str()),
            (CLIENT_SECRET_KEY, identity.secret.as_str()),
        ])?;
        info!(client_id = %identity.id, "Generated new device identity");

        Ok(EnsuredIdentity {
            identity,
            created: true,
        })
    }

    /// Forget the stored identity. The next `ensure_identity` mints a new one.
    pub fn discard(&self) -> Result<(), StoreError> {
        self.kv.remove(CLIENT_ID_KEY)?;
        self.kv.remove(CLIENT_SECRET_KEY)?;
        info!("Discarded stored device identity");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryStore;
    use std::sync::Mutex;

    /// Records each write call and the keys it carried
    #[derive(Default)]
    struct WriteLog {
        inner: MemoryStore,
        writes: Mutex<Vec<Vec<String>>>,
    }

    impl KeyValueStore for WriteLog {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.writes.lock().unwrap().push(vec![key.to_string()]);
            self.inner.set(key, value)
        }

        fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
            let keys = entries.iter().map(|(k, _)| k.to_string()).collect();
            self.writes.lock().unwrap().push(keys);
            self.inner.set_many(entries)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    fn store() -> (IdentityStore, MemoryStore) {
        let kv = MemoryStore::new();
        (IdentityStore::new(Arc::new(kv.clone())), kv)
    }

    #[test]
    fn test_ensure_identity_is_idempotent() {
        let (identities, _) = store();

        let first = identities.ensure_identity().unwrap();
        let second = identities.ensure_identity().unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.identity, second.identity);
    }

    #[test]
    fn test_identity_persisted_before_return() {
        let (identities, kv) = store();
        let ensured = identities.ensure_identity().unwrap();

        assert_eq!(
            kv.get(CLIENT_ID_KEY).unwrap().as_deref(),
            Some(ensured.identity.id.as_str())
        );
        assert_eq!(
            kv.get(CLIENT_SECRET_KEY).unwrap().as_deref(),
            Some(ensured.identity.secret.as_str())
        );
    }

    #[test]
    fn test_new_identity_written_in_one_call() {
        let kv = Arc::new(WriteLog::default());
        let identities = IdentityStore::new(kv.clone());

        identities.ensure_identity().unwrap();
        identities.ensure_identity().unwrap();

        assert_eq!(
            *kv.writes.lock().unwrap(),
            vec![vec![CLIENT_ID_KEY.to_string(), CLIENT_SECRET_KEY.to_string()]]
        );
    }

    #[test]
    fn test_existing_identity_is_reused() {
        let (identities, kv) = store();
        kv.set(CLIENT_ID_KEY, "device_existing").unwrap();
        kv.set(CLIENT_SECRET_KEY, "existing-secret").unwrap();

        let ensured = identities.ensure_identity().unwrap();
        assert!(!ensured.created);
        assert_eq!(ensured.identity.id, "device_existing");
        assert_eq!(ensured.identity.secret, "existing-secret");
    }

    #[test]
    fn test_discard_then_ensure_regenerates() {
        let (identities, _) = store();
        let old = identities.ensure_identity().unwrap().identity;

        identities.discard().unwrap();
        assert!(identities.current().unwrap().is_none());

        let new = identities.ensure_identity().unwrap();
        assert!(new.created);
        assert_ne!(new.identity.id, old.id);
        assert_ne!(new.identity.secret, old.secret);
    }

    #[test]
    fn test_incomplete_identity_is_replaced() {
        let (identities, kv) = store();
        kv.set(CLIENT_ID_KEY, "device_orphan").unwrap();

        let ensured = identities.ensure_identity().unwrap();
        assert!(ensured.created);
        assert_ne!(ensured.identity.id, "device_orphan");
    }

    #[test]
    fn test_generated_id_format() {
        let identity = DeviceIdentity::generate();
        assert!(identity.id.starts_with("device_"));
        assert!(Uuid::parse_str(&identity.id["device_".len()..]).is_ok());
        assert!(Uuid::parse_str(&identity.secret).is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let identity = DeviceIdentity {
            id: "device_1".into(),
            secret: "hunter2".into(),
        };
        let debug = format!("{:?}", identity);
        assert!(debug.contains("device_1"));
        assert!(!debug.contains("hunter2"));
    }
}
