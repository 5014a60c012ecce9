// src/secrets/mod.rs
//! Secret storage for symmetric keys.
//!
//! Keys never live in the catalog itself: the catalog key and every secure
//! database key are filed in a [`SecretStore`], which survives independently
//! of the store root. Backends:
//! - [`KeyringStore`]: OS credential store
//! - [`LockStore`]: local encrypted fallback keyed from the identity file
//! - [`MemoryStore`]: process memory, for tests and embedding

mod keyring_store;
mod lock_store;
mod memory_store;

use std::sync::Arc;

pub use keyring_store::KeyringStore;
pub use lock_store::LockStore;
pub use memory_store::MemoryStore;

use crate::aliases::SecretBytes;
use crate::config::Config;
use crate::consts::PREFIX_DB;
use crate::enums::SecretBackend;
use crate::error::Result;
use crate::identity::FileIdentity;
use crate::key_ops::{key_from_base64, key_to_base64, Key};

/// Named opaque secrets. A missing name is `StoreError::NotFound`.
pub trait SecretStore: Send + Sync {
    fn put(&self, name: &str, secret: &[u8]) -> Result<()>;

    fn get(&self, name: &str) -> Result<SecretBytes>;

    /// Removing a name that was never stored is not an error
    fn delete(&self, name: &str) -> Result<()>;
}

/// Secret name for a logical database's key
pub fn db_key_name(db_name: &str) -> String {
    format!("{PREFIX_DB}{db_name}")
}

/// File a key base64-encoded under `name`
pub fn store_key(store: &dyn SecretStore, name: &str, key: &Key) -> Result<()> {
    store.put(name, key_to_base64(key).as_bytes())
}

pub fn load_key(store: &dyn SecretStore, name: &str) -> Result<Key> {
    let encoded = store.get(name)?;
    key_from_base64(encoded.expose_secret())
}

/// Build the backend selected in `[secrets] backend`
pub fn open_secret_store(config: &Config) -> Result<Arc<dyn SecretStore>> {
    let store: Arc<dyn SecretStore> = match config.secrets.backend {
        SecretBackend::Keyring => Arc::new(KeyringStore::new(&config.secrets.service)),
        SecretBackend::Memory => Arc::new(MemoryStore::new()),
        SecretBackend::Lock => {
            let identity = FileIdentity::new(&config.paths.keys);
            Arc::new(LockStore::open(&config.paths.store, &identity)?)
        }
    };
    tracing::debug!(backend = ?config.secrets.backend, "secret store ready");
    Ok(store)
}
