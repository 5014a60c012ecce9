// tests/common.rs
//! Shared test utilities: logging setup and throwaway store roots

#![allow(dead_code)] // Each test binary uses a different subset

use std::path::{Path, PathBuf};
use std::sync::Arc;

use encrypted_kv_catalog::{DatabaseManager, MemoryStore, SecretStore};
use tempfile::TempDir;

#[cfg(feature = "logging")]
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize test-friendly logging; safe to call from every test
pub fn setup() {
    #[cfg(feature = "logging")]
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// A temporary store root with an in-memory secret store.
/// The directory is removed when this is dropped.
pub struct TestStore {
    dir: TempDir,
    pub secrets: Arc<MemoryStore>,
}

impl TestStore {
    pub fn new() -> Self {
        setup();
        TestStore {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
            secrets: Arc::new(MemoryStore::new()),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn secret_store(&self) -> Arc<dyn SecretStore> {
        self.secrets.clone()
    }

    pub fn manager(&self) -> DatabaseManager {
        self.manager_with(true)
    }

    pub fn manager_with(&self, secure_new_db: bool) -> DatabaseManager {
        DatabaseManager::with_secret_store(&self.root(), self.secret_store(), secure_new_db, 4)
            .expect("failed to open manager")
    }
}
