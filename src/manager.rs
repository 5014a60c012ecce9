// src/manager.rs
//! Database lifecycle: create, operate on, deactivate and re-key logical
//! databases recorded in the catalog.
//!
//! No logical database stays open between calls. Every entry operation
//! resolves the descriptor, fetches the key, opens the store, does one thing
//! and closes it again.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::catalog::{Catalog, CatalogConfig, DatabaseDescriptor};
use crate::config::Config;
use crate::consts::{CATALOG_DIR_PREFIX, FILE_ID_LENGTH};
use crate::engine::{release, Engine, KvPair};
use crate::enums::EventType;
use crate::error::{Result, StoreError};
use crate::gate::RotationGate;
use crate::key_ops::{generate_key, random_suffix, Key};
use crate::rotation::{copy_store, rotate_catalog};
use crate::secrets::{db_key_name, load_key, open_secret_store, store_key, SecretStore};

pub struct DatabaseManager {
    catalog: Catalog,
    secrets: Arc<dyn SecretStore>,
    config: RwLock<CatalogConfig>,
    export_workers: usize,
    // Per logical database; entry operations fail fast while it is re-keyed
    gates: Mutex<HashMap<String, Arc<RotationGate>>>,
}

impl DatabaseManager {
    /// Build the configured secret store, then open (or first create) the catalog
    pub fn open(config: &Config) -> Result<Self> {
        let secrets = open_secret_store(config)?;
        Self::with_secret_store(
            &config.paths.store,
            secrets,
            config.features.secure_new_db,
            config.rotation.export_workers,
        )
    }

    pub fn with_secret_store(
        root: &Path,
        secrets: Arc<dyn SecretStore>,
        secure_new_db: bool,
        export_workers: usize,
    ) -> Result<Self> {
        let catalog = Catalog::open_or_init(root, secrets.as_ref(), secure_new_db)?;
        let config = catalog.read_config()?;
        Ok(DatabaseManager {
            catalog,
            secrets,
            config: RwLock::new(config),
            export_workers,
            gates: Mutex::new(HashMap::new()),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn secrets(&self) -> &dyn SecretStore {
        self.secrets.as_ref()
    }

    pub fn create_database(&self, name: &str, secure: bool) -> Result<DatabaseDescriptor> {
        validate_name(name)?;
        match self.catalog.read_descriptor(name) {
            Ok(existing) if existing.active => {
                return Err(StoreError::InvalidArgument(format!(
                    "database {name} already exists"
                )))
            }
            Ok(_) => tracing::debug!(db = name, "replacing inactive database"),
            Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }

        let store_path = self.config.read().store_path.clone();
        let file = format!("{name}-{}", random_suffix(FILE_ID_LENGTH));
        let dir = store_path.join(&file);

        let engine = if secure {
            let key = generate_key();
            let engine = Engine::open(&dir, Some(&key))?;
            // Re-running a failed create overwrites this secret
            if let Err(err) = store_key(self.secrets(), &db_key_name(name), &key) {
                return release(engine, Err(err), name);
            }
            engine
        } else {
            Engine::open(&dir, None)?
        };

        let descriptor = DatabaseDescriptor::new(&store_path, &file, secure, now_ms());
        let result = self.catalog.write_descriptor(name, &descriptor, false);
        release(engine, result, name)?;

        tracing::debug!(db = name, file = %file, secure, "created database");
        Ok(descriptor)
    }

    /// Create with the catalog's `secure_new_db` default
    pub fn create_default_database(&self, name: &str) -> Result<DatabaseDescriptor> {
        let secure = self.config.read().secure_new_db;
        self.create_database(name, secure)
    }

    pub fn insert_entry(&self, name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.with_database(name, |engine| engine.set(key, value))
    }

    /// Plain overwrite, no check that the key already exists
    pub fn update_entry(&self, name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.insert_entry(name, key, value)
    }

    pub fn remove_entry(&self, name: &str, key: &[u8]) -> Result<()> {
        self.with_database(name, |engine| engine.delete(key))
    }

    /// Bulk insert through one write batch.
    ///
    /// On `PartialBatch` some entries may already be stored; retrying the
    /// whole batch is safe because inserts overwrite.
    pub fn batch_insert<I, K, V>(&self, name: &str, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        self.with_database(name, |engine| {
            let mut batch = engine.write_batch();
            for (key, value) in entries {
                batch.set(key, value);
            }
            batch.flush()
        })
    }

    pub fn get_entry(&self, name: &str, key: &[u8]) -> Result<Vec<u8>> {
        self.with_database(name, |engine| engine.get(key))
    }

    pub fn scan_entries(&self, name: &str, prefix: &[u8]) -> Result<Vec<KvPair>> {
        self.with_database(name, |engine| engine.scan(prefix))
    }

    pub fn count_entries(&self, name: &str, prefix: &[u8]) -> Result<usize> {
        self.with_database(name, |engine| engine.count(prefix))
    }

    pub fn list_databases(&self) -> Result<Vec<String>> {
        self.catalog.list_names()
    }

    pub fn list_descriptors(&self) -> Result<BTreeMap<String, DatabaseDescriptor>> {
        self.catalog.list_descriptors()
    }

    pub fn read_configuration(&self) -> Result<CatalogConfig> {
        let config = self.catalog.read_config()?;
        *self.config.write() = config.clone();
        Ok(config)
    }

    pub fn update_configuration(&self, config: CatalogConfig) -> Result<()> {
        self.catalog.write_config(&config)?;
        *self.config.write() = config;
        Ok(())
    }

    /// Soft delete: the descriptor stays, marked inactive. Files and key are kept.
    pub fn deactivate_database(&self, name: &str) -> Result<DatabaseDescriptor> {
        let gate = self.gate(name);
        let _op = gate.enter()?;
        let mut descriptor = self.active_descriptor(name)?;
        descriptor.active = false;
        descriptor.deleted = now_ms();

        self.catalog.write_descriptor(name, &descriptor, true)?;
        self.catalog
            .record_event(EventType::Delete, &format!("Deactivated db object: {name}"))?;
        Ok(descriptor)
    }

    /// Move a secure database to a new directory under a new key.
    ///
    /// Operations on `name` fail with `RotationInProgress` from the export
    /// until the old directory is gone. The old directory is removed only
    /// after the catalog points at the new one; on any earlier failure the
    /// database is left as it was.
    pub fn rotate_database_key(&self, name: &str) -> Result<DatabaseDescriptor> {
        let gate = self.gate(name);
        let _rotation = gate.begin()?;

        let descriptor = self.active_descriptor(name)?;
        if !descriptor.secure {
            return Err(StoreError::InvalidArgument(format!(
                "database {name} is not secure"
            )));
        }

        let secret_name = db_key_name(name);
        let old_key = load_key(self.secrets(), &secret_name)?;
        let source = Engine::open(&descriptor.location(), Some(&old_key))?;

        let new_key = generate_key();
        let new_file = format!("{name}-{}", random_suffix(FILE_ID_LENGTH));
        let new_dir = descriptor.db_path.join(&new_file);
        let records = copy_store(source, &new_dir, Some(&new_key), self.export_workers)?;

        let mut rotated = descriptor.clone();
        rotated.db_file = new_file;
        rotated.last_rotated = now_ms();

        if let Err(err) = self.swap_database_key(name, &rotated, &old_key, &new_key) {
            discard_dir(&new_dir);
            return Err(err);
        }
        discard_dir(&descriptor.location());

        tracing::info!(db = name, records, file = %rotated.db_file, "rotated database key");
        Ok(rotated)
    }

    /// Re-key the catalog itself and make the copy current
    pub fn rotate_catalog_key(&self) -> Result<String> {
        let rotated = rotate_catalog(&self.catalog, self.export_workers)?;
        let file = rotated.file.clone();
        self.catalog.adopt(rotated, self.secrets())?;
        self.config.write().meta_file = file.clone();
        Ok(file)
    }

    fn swap_database_key(
        &self,
        name: &str,
        rotated: &DatabaseDescriptor,
        old_key: &Key,
        new_key: &Key,
    ) -> Result<()> {
        let secret_name = db_key_name(name);
        store_key(self.secrets(), &secret_name, new_key)?;

        if let Err(err) = self.catalog.write_descriptor(name, rotated, true) {
            if let Err(restore_err) = store_key(self.secrets(), &secret_name, old_key) {
                tracing::warn!(db = name, error = %restore_err, "could not restore previous key");
            }
            return Err(err);
        }
        Ok(())
    }

    fn active_descriptor(&self, name: &str) -> Result<DatabaseDescriptor> {
        let descriptor = self.catalog.read_descriptor(name)?;
        if !descriptor.active {
            return Err(StoreError::Inactive(name.to_string()));
        }
        Ok(descriptor)
    }

    fn database_key(&self, name: &str, descriptor: &DatabaseDescriptor) -> Result<Option<Key>> {
        if descriptor.secure {
            Ok(Some(load_key(self.secrets(), &db_key_name(name))?))
        } else {
            Ok(None)
        }
    }

    fn gate(&self, name: &str) -> Arc<RotationGate> {
        self.gates.lock().entry(name.to_string()).or_default().clone()
    }

    /// Open `name` for exactly one operation
    fn with_database<T, F>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Engine) -> Result<T>,
    {
        let gate = self.gate(name);
        let _op = gate.enter()?;

        let descriptor = self.active_descriptor(name)?;
        let key = self.database_key(name, &descriptor)?;
        let mut engine = Engine::open(&descriptor.location(), key.as_ref())?;
        let result = f(&mut engine);
        release(engine, result, name)
    }
}

fn validate_name(name: &str) -> Result<()> {
    // `<name>-<suffix>` must never look like a catalog directory
    let bad = name.is_empty()
        || name.contains(['/', '\\', '\0'])
        || name == "."
        || name.contains("..")
        || format!("{name}-").starts_with(CATALOG_DIR_PREFIX);
    if bad {
        return Err(StoreError::InvalidArgument(format!(
            "invalid database name {name:?}"
        )));
    }
    Ok(())
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn discard_dir(dir: &Path) {
    if let Err(err) = fs::remove_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), error = %err, "could not remove database directory");
    }
}
