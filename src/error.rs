// src/error.rs
//! Public error type for the entire crate

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Secret store error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Invalid base64 key material: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} - trying to access inactive db")]
    Inactive(String),

    #[error("maintenance: rotating key")]
    RotationInProgress,

    #[error("rotate flag already raised")]
    RotationAlreadyInProgress,

    /// SQLCipher refuses the key (wrong key, or a key given for a plaintext store)
    #[error("key does not open {}", .0.display())]
    KeyMismatch(PathBuf),

    #[error("write batch failed after {committed} of {total} entries were persisted: {source}")]
    PartialBatch {
        committed: usize,
        total: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("invalid key length: expected {expected} bytes, found {found}")]
    InvalidKeyLength { expected: usize, found: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
