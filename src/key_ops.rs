// src/key_ops.rs
//! Key generation and representation utilities
//!
//! Keys live in `DbKey32` (zeroized on drop). The secret store holds them
//! base64-encoded; SQLCipher receives them as a raw hex blob literal.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::distr::{Alphanumeric, SampleString};

use crate::aliases::{DbKey32, SecureRandomExt};
use crate::consts::KEY_LENGTH;
use crate::error::{Result, StoreError};

pub type Key = DbKey32;

/// Generate a new random 256-bit database key
#[inline]
pub fn generate_key() -> Key {
    Key::random()
}

/// Copy raw bytes into a key, checking the length
pub fn key_from_slice(bytes: &[u8]) -> Result<Key> {
    let raw: [u8; KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| StoreError::InvalidKeyLength {
            expected: KEY_LENGTH,
            found: bytes.len(),
        })?;
    Ok(Key::new(raw))
}

/// Duplicate a key without requiring `Clone` on the secret wrapper
pub fn copy_key(key: &Key) -> Key {
    Key::new(*key.expose_secret())
}

pub fn key_to_base64(key: &Key) -> String {
    STANDARD.encode(key.expose_secret())
}

pub fn key_from_base64(encoded: &[u8]) -> Result<Key> {
    let raw = STANDARD.decode(encoded)?;
    key_from_slice(&raw)
}

/// SQLCipher raw-key literal: `x'<64 hex chars>'`
pub(crate) fn sqlcipher_key_literal(key: &Key) -> String {
    format!("x'{}'", hex::encode(key.expose_secret()))
}

/// Random alphanumeric suffix used in on-disk directory names
pub fn random_suffix(length: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), length)
}
