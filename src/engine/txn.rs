// src/engine/txn.rs
use rusqlite::{params, OptionalExtension, Transaction};

use crate::error::{Result, StoreError};

/// Point operations inside one engine transaction
pub struct Txn<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> Txn<'conn> {
    pub(super) fn new(tx: Transaction<'conn>) -> Self {
        Txn { tx }
    }

    pub(super) fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    pub fn get_opt(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .tx
            .query_row("SELECT v FROM kv WHERE k = ?1", params![key], |r| r.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.get_opt(key)?
            .ok_or_else(|| StoreError::NotFound(format!("key {}", String::from_utf8_lossy(key))))
    }

    /// Insert or overwrite; an existing key keeps its row position
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.tx.execute(
            "INSERT INTO kv (k, v) VALUES (?1, ?2)
             ON CONFLICT(k) DO UPDATE SET v = excluded.v",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.tx
            .execute("DELETE FROM kv WHERE k = ?1", params![key])?;
        Ok(())
    }
}
