// src/enums.rs
//! Public enum types used throughout the crate
//!
//! Central location for the #[derive(...)] enums that represent
//! persisted or user-visible choices: audit event kinds, secret backends.

use serde::{Deserialize, Serialize};

/// Kind of an audit event appended to the catalog.
///
/// Persisted as its code, `Write = 1` through `ConfigChange = 6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EventType {
    Write = 1,
    Read = 2,
    Create = 3,
    Delete = 4,
    Update = 5,
    ConfigChange = 6,
}

impl From<EventType> for u8 {
    fn from(event: EventType) -> u8 {
        event as u8
    }
}

impl TryFrom<u8> for EventType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(EventType::Write),
            2 => Ok(EventType::Read),
            3 => Ok(EventType::Create),
            4 => Ok(EventType::Delete),
            5 => Ok(EventType::Update),
            6 => Ok(EventType::ConfigChange),
            other => Err(format!("unknown event type code {other}")),
        }
    }
}

/// Where symmetric keys are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// OS credential store
    #[default]
    Keyring,
    /// Local lock database keyed by the identity-derived secret
    Lock,
    /// Process memory only, lost on exit
    Memory,
}
