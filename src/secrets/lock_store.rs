// src/secrets/lock_store.rs
use std::path::{Path, PathBuf};

use super::SecretStore;
use crate::aliases::SecretBytes;
use crate::consts::{KEY_LENGTH, LOCK_DB};
use crate::engine::{release, Engine};
use crate::error::{Result, StoreError};
use crate::identity::Identity;
use crate::key_ops::{key_from_slice, Key};

/// Bootstrap secret store: an encrypted store at `<root>/lock.db` whose key
/// is derived from the local identity, so it works before any OS vault does.
pub struct LockStore {
    dir: PathBuf,
    key: Key,
}

impl LockStore {
    /// Derive the lock key from `identity`, creating the identity on first use
    pub fn open(root: &Path, identity: &dyn Identity) -> Result<Self> {
        let secret = match identity.derive_local_secret(KEY_LENGTH) {
            Ok(secret) => secret,
            Err(StoreError::NotFound(_)) => {
                tracing::info!("no local identity yet, generating one for the lock store");
                identity.generate_identity(false)?;
                identity.derive_local_secret(KEY_LENGTH)?
            }
            Err(err) => return Err(err),
        };

        let store = LockStore {
            dir: root.join(LOCK_DB),
            key: key_from_slice(secret.as_bytes())?,
        };

        // Fails with KeyMismatch right away if the identity changed underneath
        Engine::open(&store.dir, Some(&store.key))?.close()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn with_engine<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Engine) -> Result<T>,
    {
        let mut engine = Engine::open(&self.dir, Some(&self.key))?;
        let result = f(&mut engine);
        release(engine, result, "lock")
    }
}

impl SecretStore for LockStore {
    fn put(&self, name: &str, secret: &[u8]) -> Result<()> {
        self.with_engine(|engine| engine.set(name.as_bytes(), secret))
    }

    fn get(&self, name: &str) -> Result<SecretBytes> {
        self.with_engine(|engine| engine.view(|txn| txn.get_opt(name.as_bytes())))?
            .map(SecretBytes::new)
            .ok_or_else(|| StoreError::NotFound(format!("secret {name}")))
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.with_engine(|engine| engine.delete(name.as_bytes()))
    }
}
