// src/aliases.rs
//! Re-exports secure-gate's ergonomic secret types
//!
//! These are the canonical key types used throughout encrypted-kv-catalog.

pub use secure_gate::{dynamic_alias, fixed_alias, SecureConversionsExt, SecureRandomExt};

// Fixed-size secrets
fixed_alias!(DbKey32, 32); // 256-bit SQLCipher raw key (catalog, databases, lock store)

// Dynamic secrets
dynamic_alias!(SecretBytes, Vec<u8>); // opaque value read back from a secret store
