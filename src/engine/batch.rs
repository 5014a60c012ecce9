// src/engine/batch.rs
use rusqlite::{params, Connection};

use super::KvPair;
use crate::consts::BATCH_FLUSH_CHUNK;
use crate::error::{Result, StoreError};

/// Bulk insert: entries are staged in memory and written by [`WriteBatch::flush`].
///
/// The flush commits in chunks of `BATCH_FLUSH_CHUNK`, so a failure can leave
/// earlier chunks persisted. Dropping an unflushed batch writes nothing.
pub struct WriteBatch<'conn> {
    conn: &'conn mut Connection,
    staged: Vec<KvPair>,
}

impl<'conn> WriteBatch<'conn> {
    pub(super) fn new(conn: &'conn mut Connection) -> Self {
        WriteBatch {
            conn,
            staged: Vec::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.staged.push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Write everything staged; returns the number of entries written
    pub fn flush(self) -> Result<usize> {
        let total = self.staged.len();
        let mut committed = 0;

        for chunk in self.staged.chunks(BATCH_FLUSH_CHUNK) {
            if let Err(source) = write_chunk(self.conn, chunk) {
                if committed == 0 {
                    return Err(StoreError::Sql(source));
                }
                return Err(StoreError::PartialBatch {
                    committed,
                    total,
                    source,
                });
            }
            committed += chunk.len();
        }

        Ok(committed)
    }
}

fn write_chunk(conn: &mut Connection, chunk: &[KvPair]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO kv (k, v) VALUES (?1, ?2)
             ON CONFLICT(k) DO UPDATE SET v = excluded.v",
        )?;
        for (key, value) in chunk {
            stmt.execute(params![key, value])?;
        }
    }
    tx.commit()
}
