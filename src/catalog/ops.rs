// src/catalog/ops.rs
//! Catalog reads and writes. Each call is one catalog session; a record
//! write and its audit event commit in the same transaction.

use std::collections::BTreeMap;

use super::{AuditEvent, Catalog, CatalogConfig, DatabaseDescriptor};
use crate::consts::{CONFIG_KEY, PREFIX_DB, PREFIX_EVENT};
use crate::engine::{Engine, Txn};
use crate::enums::EventType;
use crate::error::{Result, StoreError};

fn descriptor_key(name: &str) -> String {
    format!("{PREFIX_DB}{name}")
}

fn event_key(tstamp: i64) -> String {
    // Zero-padded so byte order is time order
    format!("{PREFIX_EVENT}{tstamp:020}")
}

impl Catalog {
    pub fn write_config(&self, config: &CatalogConfig) -> Result<()> {
        let value = serde_json::to_vec(config)?;
        let tstamp = self.next_event_ms();
        self.session(|engine| {
            engine.update(|txn| {
                txn.set(CONFIG_KEY.as_bytes(), &value)?;
                append_event(txn, EventType::ConfigChange, "Updating config", tstamp)
            })
        })
    }

    pub fn read_config(&self) -> Result<CatalogConfig> {
        let raw = self
            .session(|engine| engine.view(|txn| txn.get_opt(CONFIG_KEY.as_bytes())))?
            .ok_or_else(|| StoreError::NotFound("catalog config".to_string()))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn write_descriptor(
        &self,
        name: &str,
        descriptor: &DatabaseDescriptor,
        is_update: bool,
    ) -> Result<()> {
        let value = serde_json::to_vec(descriptor)?;
        let (event_type, comment) = if is_update {
            (EventType::Update, format!("Updated db object: {name}"))
        } else {
            (EventType::Create, format!("Created db object: {name}"))
        };
        let tstamp = self.next_event_ms();

        self.session(|engine| {
            engine.update(|txn| {
                txn.set(descriptor_key(name).as_bytes(), &value)?;
                append_event(txn, event_type, &comment, tstamp)
            })
        })
    }

    pub fn read_descriptor(&self, name: &str) -> Result<DatabaseDescriptor> {
        let raw = self
            .session(|engine| engine.view(|txn| txn.get_opt(descriptor_key(name).as_bytes())))?
            .ok_or_else(|| StoreError::NotFound(format!("database {name}")))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Every descriptor, keyed by logical name (prefix stripped)
    pub fn list_descriptors(&self) -> Result<BTreeMap<String, DatabaseDescriptor>> {
        self.session(|engine| {
            let mut descriptors: BTreeMap<String, DatabaseDescriptor> = BTreeMap::new();
            engine.for_each_prefix(PREFIX_DB.as_bytes(), |key, value| {
                let name = String::from_utf8_lossy(&key[PREFIX_DB.len()..]).into_owned();
                descriptors.insert(name, serde_json::from_slice(value)?);
                Ok(())
            })?;
            Ok(descriptors)
        })
    }

    pub fn list_names(&self) -> Result<Vec<String>> {
        Ok(self.list_descriptors()?.into_keys().collect())
    }

    /// Audit trail, oldest first
    pub fn list_events(&self) -> Result<Vec<AuditEvent>> {
        self.session(|engine| {
            let mut events: Vec<AuditEvent> = Vec::new();
            engine.for_each_prefix(PREFIX_EVENT.as_bytes(), |_, value| {
                events.push(serde_json::from_slice(value)?);
                Ok(())
            })?;
            Ok(events)
        })
    }

    /// Append a standalone audit event
    pub fn record_event(&self, event_type: EventType, comment: &str) -> Result<()> {
        let tstamp = self.next_event_ms();
        self.session(|engine| engine.update(|txn| append_event(txn, event_type, comment, tstamp)))
    }

    /// Raw write of one catalog entry
    pub fn put_entry(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.session(|engine| engine.set(key, value))
    }

    pub fn get_entry(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.session(|engine| engine.get(key))
    }

    /// Bulk write into the catalog through one write batch
    pub fn batch_insert<I, K, V>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        self.session(|engine| {
            let mut batch = engine.write_batch();
            for (key, value) in entries {
                batch.set(key, value);
            }
            batch.flush()
        })
    }

    pub fn count(&self, prefix: &[u8]) -> Result<usize> {
        self.session(|engine| engine.count(prefix))
    }
}

/// Point a freshly rotated catalog's config at its own file name.
/// Works on an open handle because the rotation still holds the gate.
pub(super) fn record_meta_file(engine: &mut Engine, file: &str, tstamp: i64) -> Result<()> {
    engine.update(|txn| {
        let raw = txn.get(CONFIG_KEY.as_bytes())?;
        let mut config: CatalogConfig = serde_json::from_slice(&raw)?;
        config.meta_file = file.to_string();
        txn.set(CONFIG_KEY.as_bytes(), &serde_json::to_vec(&config)?)?;
        append_event(txn, EventType::ConfigChange, "Updating config", tstamp)
    })
}

fn append_event(txn: &Txn<'_>, event_type: EventType, comment: &str, tstamp: i64) -> Result<()> {
    let event = AuditEvent {
        event_type,
        comment: comment.to_string(),
        tstamp,
    };
    txn.set(event_key(tstamp).as_bytes(), &serde_json::to_vec(&event)?)
}
