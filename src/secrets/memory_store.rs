// src/secrets/memory_store.rs
use std::collections::HashMap;

use parking_lot::Mutex;

use super::SecretStore;
use crate::aliases::SecretBytes;
use crate::error::{Result, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    secrets: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.secrets.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.lock().is_empty()
    }
}

impl SecretStore for MemoryStore {
    fn put(&self, name: &str, secret: &[u8]) -> Result<()> {
        self.secrets.lock().insert(name.to_string(), secret.to_vec());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<SecretBytes> {
        self.secrets
            .lock()
            .get(name)
            .map(|secret| SecretBytes::new(secret.clone()))
            .ok_or_else(|| StoreError::NotFound(format!("secret {name}")))
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.secrets.lock().remove(name);
        Ok(())
    }
}
