// src/lib.rs
//! encrypted-kv-catalog: a catalog and key lifecycle for encrypted embedded stores
//!
//! Features:
//! - SQLCipher-backed ordered key-value stores, one directory per logical database
//! - An encrypted catalog of descriptors, config and an append-only audit trail
//! - Keys kept outside the stores: OS keyring, identity-keyed lock store, or memory
//! - Live key rotation by parallel export into a freshly keyed store
//! - Full secure-gate integration for key material

pub mod aliases;
pub mod catalog;
pub mod config;
pub mod consts;
pub mod engine;
pub mod enums;
pub mod error;
pub mod gate;
pub mod identity;
pub mod key_ops;
pub mod manager;
pub mod rotation;
pub mod secrets;

// Re-export everything users need at the crate root
pub use aliases::{DbKey32, SecretBytes, SecureConversionsExt, SecureRandomExt};
pub use catalog::{AuditEvent, Catalog, CatalogConfig, DatabaseDescriptor};
pub use config::{load as load_config, Config};
pub use engine::{Engine, KvPair};
pub use enums::{EventType, SecretBackend};
pub use error::{Result, StoreError};
pub use gate::{RotationGate, RotationGuard};
pub use identity::{FileIdentity, Identity};
pub use manager::DatabaseManager;
pub use rotation::{rotate_catalog, RotatedCatalog};
pub use secrets::{open_secret_store, KeyringStore, LockStore, MemoryStore, SecretStore};
