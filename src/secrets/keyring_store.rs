// src/secrets/keyring_store.rs
use keyring::Entry;

use super::SecretStore;
use crate::aliases::SecretBytes;
use crate::error::{Result, StoreError};

/// OS credential store (Keychain, Credential Manager, kernel keyring)
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: &str) -> Self {
        KeyringStore {
            service: service.to_string(),
        }
    }

    fn entry(&self, name: &str) -> Result<Entry> {
        Ok(Entry::new(&self.service, name)?)
    }
}

impl SecretStore for KeyringStore {
    fn put(&self, name: &str, secret: &[u8]) -> Result<()> {
        self.entry(name)?.set_secret(secret)?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<SecretBytes> {
        match self.entry(name)?.get_secret() {
            Ok(secret) => Ok(SecretBytes::new(secret)),
            Err(keyring::Error::NoEntry) => Err(StoreError::NotFound(format!("secret {name}"))),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, name: &str) -> Result<()> {
        match self.entry(name)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
