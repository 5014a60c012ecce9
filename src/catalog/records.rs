// src/catalog/records.rs
//! Records persisted in the catalog as JSON

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::enums::EventType;

/// Catalog-wide defaults, stored once under `fxstorage_config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub store_path: PathBuf,
    pub secure_new_db: bool,
    pub meta_store: PathBuf,
    pub meta_file: String,
}

impl CatalogConfig {
    pub fn new(root: &Path, secure_new_db: bool, meta_file: &str) -> Self {
        CatalogConfig {
            store_path: root.to_path_buf(),
            secure_new_db,
            meta_store: root.to_path_buf(),
            meta_file: meta_file.to_string(),
        }
    }
}

/// Where one logical database lives and what state it is in.
/// Never removed: deactivation sets `active = false` and `deleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    pub db_path: PathBuf,
    pub db_file: String,
    pub secure: bool,
    pub created: i64,
    pub active: bool,
    pub last_rotated: i64,
    pub deleted: i64,
}

impl DatabaseDescriptor {
    pub fn new(db_path: &Path, db_file: &str, secure: bool, created: i64) -> Self {
        DatabaseDescriptor {
            db_path: db_path.to_path_buf(),
            db_file: db_file.to_string(),
            secure,
            created,
            active: true,
            last_rotated: 0,
            deleted: 0,
        }
    }

    /// Directory holding the database's engine file
    pub fn location(&self) -> PathBuf {
        self.db_path.join(&self.db_file)
    }
}

/// Append-only audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub comment: String,
    /// Unix milliseconds
    pub tstamp: i64,
}
