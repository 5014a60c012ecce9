// src/catalog/mod.rs
//! The catalog: one encrypted store describing every logical database
//!
//! Namespaces inside the catalog store:
//! - `fxstorage_config`: [`CatalogConfig`]
//! - `fxstorage_db:<name>`: [`DatabaseDescriptor`]
//! - `fxstorage_event:<millis>`: [`AuditEvent`], append-only
//!
//! A [`Catalog`] is the single in-process pointer to the current catalog
//! file and key. Operations never hold the store open between calls, and
//! while a key rotation runs they fail fast with `RotationInProgress`.

mod ops;
mod records;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};

pub use records::{AuditEvent, CatalogConfig, DatabaseDescriptor};

use crate::consts::{CATALOG_DIR_PREFIX, CATALOG_ID_LENGTH, CATALOG_KEY_NAME, ENGINE_FILE};
use crate::engine::{release, Engine};
use crate::error::{Result, StoreError};
use crate::gate::{RotationGate, RotationGuard};
use crate::key_ops::{copy_key, generate_key, random_suffix, Key};
use crate::rotation::RotatedCatalog;
use crate::secrets::{load_key, store_key, SecretStore};

struct CatalogPointer {
    file: String,
    key: Key,
}

pub struct Catalog {
    root: PathBuf,
    current: RwLock<CatalogPointer>,
    gate: RotationGate,
    last_event_ms: Mutex<i64>,
}

impl Catalog {
    fn new(root: &Path, file: String, key: Key) -> Self {
        Catalog {
            root: root.to_path_buf(),
            current: RwLock::new(CatalogPointer { file, key }),
            gate: RotationGate::new(),
            last_event_ms: Mutex::new(0),
        }
    }

    /// Create a fresh catalog under `root`, file its key in `secrets`
    /// and store the default config.
    pub fn init(root: &Path, secrets: &dyn SecretStore, secure_new_db: bool) -> Result<Self> {
        fs::create_dir_all(root)?;

        let file = format!("{CATALOG_DIR_PREFIX}{}", random_suffix(CATALOG_ID_LENGTH));
        let key = generate_key();
        store_key(secrets, CATALOG_KEY_NAME, &key)?;
        Engine::open(&root.join(&file), Some(&key))?.close()?;

        let catalog = Catalog::new(root, file.clone(), key);
        catalog.write_config(&CatalogConfig::new(root, secure_new_db, &file))?;

        tracing::info!(root = %root.display(), file = %file, "initialized catalog");
        Ok(catalog)
    }

    /// Reopen the newest catalog under `root` that the key in `secrets` opens.
    ///
    /// A newer `meta-*` left behind by a rotation that never completed does
    /// not open with the stored key; it is skipped in favour of the next one.
    pub fn open(root: &Path, secrets: &dyn SecretStore) -> Result<Self> {
        let candidates = catalogs_newest_first(root)?;
        if candidates.is_empty() {
            return Err(StoreError::NotFound(format!("catalog in {}", root.display())));
        }
        let key = load_key(secrets, CATALOG_KEY_NAME)?;

        let mut mismatch = None;
        for file in candidates {
            match Engine::open(&root.join(&file), Some(&key)).and_then(Engine::close) {
                Ok(()) => {
                    tracing::debug!(root = %root.display(), file = %file, "opened catalog");
                    return Ok(Catalog::new(root, file, key));
                }
                Err(StoreError::KeyMismatch(dir)) => {
                    tracing::warn!(dir = %dir.display(), "catalog does not open with stored key, skipping");
                    if mismatch.is_none() {
                        mismatch = Some(StoreError::KeyMismatch(dir));
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Err(mismatch
            .unwrap_or_else(|| StoreError::NotFound(format!("catalog in {}", root.display()))))
    }

    pub fn open_or_init(
        root: &Path,
        secrets: &dyn SecretStore,
        secure_new_db: bool,
    ) -> Result<Self> {
        if root.exists() && !catalogs_newest_first(root)?.is_empty() {
            Self::open(root, secrets)
        } else {
            Self::init(root, secrets, secure_new_db)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_file(&self) -> String {
        self.current.read().file.clone()
    }

    pub fn current_path(&self) -> PathBuf {
        self.root.join(&self.current.read().file)
    }

    pub fn is_rotating(&self) -> bool {
        self.gate.is_rotating()
    }

    /// Raise the rotation flag and wait for in-flight operations to drain.
    /// The flag drops with the guard, on every exit path.
    pub fn begin_rotation(&self) -> Result<RotationGuard<'_>> {
        self.gate.begin()
    }

    /// Open the current catalog without the rotation check.
    /// Only rotation uses this, while it holds the guard.
    pub(crate) fn open_current(&self) -> Result<Engine> {
        let current = self.current.read();
        Engine::open(&self.root.join(&current.file), Some(&current.key))
    }

    /// Run one operation against a freshly opened catalog handle
    pub(crate) fn session<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Engine) -> Result<T>,
    {
        let _shared = self.gate.enter()?;

        let mut engine = {
            let current = self.current.read();
            Engine::open(&self.root.join(&current.file), Some(&current.key))?
        };
        let result = f(&mut engine);
        release(engine, result, "catalog")
    }

    /// Make a rotated catalog the current one.
    ///
    /// Runs while the rotation still holds the gate: the new file name goes
    /// into the copy's config, the key into `secrets`, then the in-memory
    /// pointer swaps. On failure the copy is removed and the old catalog
    /// stays current.
    pub fn adopt(&self, mut rotated: RotatedCatalog<'_>, secrets: &dyn SecretStore) -> Result<()> {
        if !self.gate.is_held_by(&rotated.guard) {
            return Err(StoreError::InvalidArgument(
                "rotated catalog belongs to another catalog".to_string(),
            ));
        }

        let tstamp = self.next_event_ms();
        let mut engine = Engine::open(&rotated.dir, Some(&rotated.key))?;
        let result = ops::record_meta_file(&mut engine, &rotated.file, tstamp);
        release(engine, result, "rotated catalog")?;

        store_key(secrets, CATALOG_KEY_NAME, &rotated.key)?;

        let previous = {
            let mut current = self.current.write();
            current.key = copy_key(&rotated.key);
            std::mem::replace(&mut current.file, rotated.file.clone())
        };
        rotated.adopted = true;

        tracing::info!(from = %previous, to = %rotated.file, "switched active catalog");
        Ok(())
    }

    /// Strictly increasing millisecond stamps for event keys
    fn next_event_ms(&self) -> i64 {
        let mut last = self.last_event_ms.lock();
        let now = chrono::Utc::now().timestamp_millis();
        *last = now.max(*last + 1);
        *last
    }
}

/// `meta-*` directories, newest first by modification time of the engine file
fn catalogs_newest_first(root: &Path) -> Result<Vec<String>> {
    let mut found: Vec<(SystemTime, String)> = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(CATALOG_DIR_PREFIX) || !entry.file_type()?.is_dir() {
            continue;
        }

        let engine_file = entry.path().join(ENGINE_FILE);
        match fs::metadata(&engine_file).and_then(|m| m.modified()) {
            Ok(modified) => found.push((modified, name)),
            Err(err) => {
                tracing::warn!(dir = %name, error = %err, "skipping unreadable catalog");
            }
        }
    }

    found.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(found.into_iter().map(|(_, name)| name).collect())
}
