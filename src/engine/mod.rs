// src/engine/mod.rs
//! Ordered key-value engine on top of SQLCipher
//!
//! Every database (logical databases, the catalog, the lock store) is a
//! directory holding one SQLCipher file with a single `kv` table. Keys are
//! BLOBs compared bytewise, which gives ordered prefix scans.
//!
//! Handles are short-lived: open, run one logical operation, close.
//! [`release`] closes a handle after an operation and keeps the primary
//! error when both fail.

mod batch;
mod stream;
mod txn;

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OpenFlags, TransactionBehavior};

use crate::consts::{CIPHER_PAGE_SIZE, ENGINE_FILE};
use crate::error::{Result, StoreError};
use crate::key_ops::{copy_key, sqlcipher_key_literal, Key};

pub use batch::WriteBatch;
pub use txn::Txn;

/// One key/value pair as stored
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Where an engine file lives and the key that opens it
pub(crate) struct Location {
    dir: PathBuf,
    file: PathBuf,
    key: Option<Key>,
}

impl Location {
    fn new(dir: &Path, key: Option<&Key>) -> Self {
        Location {
            dir: dir.to_path_buf(),
            file: dir.join(ENGINE_FILE),
            key: key.map(copy_key),
        }
    }

    /// Open a raw connection and apply the cipher settings
    fn connect(&self, flags: OpenFlags) -> Result<Connection> {
        let conn = Connection::open_with_flags(&self.file, flags)?;

        if let Some(key) = &self.key {
            conn.execute_batch(&format!(
                r#"
                PRAGMA key = "{}";
                PRAGMA cipher_page_size = {CIPHER_PAGE_SIZE};
                PRAGMA cipher_hmac_algorithm = HMAC_SHA512;
                PRAGMA cipher_kdf_algorithm = PBKDF2_HMAC_SHA512;
                PRAGMA cipher_plaintext_header_size = 0;
                "#,
                sqlcipher_key_literal(key)
            ))?;
        }

        // First real read; a wrong key fails here, not later
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |r| {
            r.get::<_, i64>(0)
        })
        .map_err(|e| self.classify(e))?;

        Ok(conn)
    }

    fn classify(&self, err: rusqlite::Error) -> StoreError {
        match err.sqlite_error_code() {
            Some(ErrorCode::NotADatabase) => StoreError::KeyMismatch(self.dir.clone()),
            _ => StoreError::Sql(err),
        }
    }
}

/// An open database handle, exclusively owned by whoever opened it
pub struct Engine {
    conn: Connection,
    location: Location,
}

impl Engine {
    /// Open (creating if needed) the database in `dir`.
    /// `key = None` opens an unsecured store.
    pub fn open(dir: &Path, key: Option<&Key>) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let location = Location::new(dir, key);
        let conn = location.connect(OpenFlags::default())?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                id INTEGER PRIMARY KEY,
                k  BLOB NOT NULL UNIQUE,
                v  BLOB NOT NULL
            );
            "#,
        )?;

        tracing::debug!(dir = %dir.display(), secure = key.is_some(), "opened store");
        Ok(Engine { conn, location })
    }

    pub fn open_unsecured(dir: &Path) -> Result<Self> {
        Self::open(dir, None)
    }

    pub fn close(self) -> Result<()> {
        let dir = self.location.dir.clone();
        self.conn.close().map_err(|(_, e)| StoreError::Sql(e))?;
        tracing::debug!(dir = %dir.display(), "closed store");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.location.dir
    }

    pub fn is_secure(&self) -> bool {
        self.location.key.is_some()
    }

    /// Run `f` in a write transaction; commits only when `f` succeeds
    pub fn update<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Txn<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let txn = Txn::new(tx);
        let out = f(&txn)?;
        txn.commit()?;
        Ok(out)
    }

    /// Run `f` in a read transaction; always rolled back
    pub fn view<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Txn<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let txn = Txn::new(tx);
        f(&txn)
    }

    pub fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        self.view(|txn| txn.get(key))
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.update(|txn| txn.set(key, value))
    }

    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.update(|txn| txn.delete(key))
    }

    /// All pairs whose key starts with `prefix`, in key order
    pub fn scan(&self, prefix: &[u8]) -> Result<Vec<KvPair>> {
        let mut pairs = Vec::new();
        self.for_each_prefix(prefix, |k, v| {
            pairs.push((k.to_vec(), v.to_vec()));
            Ok(())
        })?;
        Ok(pairs)
    }

    pub fn count(&self, prefix: &[u8]) -> Result<usize> {
        let mut count = 0;
        self.for_each_prefix(prefix, |_, _| {
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }

    /// Seek to `prefix` and walk forward while keys still match it
    pub fn for_each_prefix<F>(&self, prefix: &[u8], mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT k, v FROM kv WHERE k >= ?1 ORDER BY k")?;
        let mut rows = stmt.query(params![prefix])?;
        while let Some(row) = rows.next()? {
            let key: Vec<u8> = row.get(0)?;
            if !key.starts_with(prefix) {
                break;
            }
            let value: Vec<u8> = row.get(1)?;
            f(&key, &value)?;
        }
        Ok(())
    }

    pub fn write_batch(&mut self) -> WriteBatch<'_> {
        WriteBatch::new(&mut self.conn)
    }
}

/// Close `engine` after an operation produced `result`.
///
/// On success the close error is returned; after a failure it is only
/// logged, since the operation's error is the one the caller needs.
pub(crate) fn release<T>(engine: Engine, result: Result<T>, what: &str) -> Result<T> {
    match result {
        Ok(value) => {
            engine.close()?;
            Ok(value)
        }
        Err(err) => {
            let dir = engine.dir().to_path_buf();
            if let Err(close_err) = engine.close() {
                tracing::warn!(
                    store = what,
                    dir = %dir.display(),
                    error = %close_err,
                    "error closing store after failed operation"
                );
            }
            Err(err)
        }
    }
}
