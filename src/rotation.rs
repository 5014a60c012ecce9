// src/rotation.rs
//! Live key rotation by full export/import
//!
//! A store is re-keyed by streaming every pair out of it into a brand-new
//! store under a fresh key. The source is only read, so a failed rotation
//! leaves it exactly as it was; the half-written target is removed.
//!
//! The export is materialized in memory before the bulk load, which bounds
//! rotation to stores that fit in RAM. Catalogs (descriptors, config,
//! events) are small enough for that.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::consts::{CATALOG_DIR_PREFIX, CATALOG_ID_LENGTH};
use crate::engine::{release, Engine};
use crate::error::Result;
use crate::gate::RotationGuard;
use crate::key_ops::{generate_key, random_suffix, Key};

/// A freshly keyed copy of the catalog, not yet adopted.
///
/// Holds the catalog's rotation guard, so catalog operations keep failing
/// with `RotationInProgress` until it is adopted or dropped. Dropping it
/// without [`Catalog::adopt`] removes the copy.
pub struct RotatedCatalog<'a> {
    pub file: String,
    pub key: Key,
    pub records: usize,
    pub(crate) dir: PathBuf,
    pub(crate) adopted: bool,
    pub(crate) guard: RotationGuard<'a>,
}

impl fmt::Debug for RotatedCatalog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatedCatalog")
            .field("file", &self.file)
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

impl Drop for RotatedCatalog<'_> {
    fn drop(&mut self) {
        if !self.adopted {
            tracing::warn!(file = %self.file, "rotated catalog not adopted, removing copy");
            discard(&self.dir);
        }
    }
}

/// Copy the current catalog into `meta-<new suffix>` under a new key.
///
/// Catalog operations fail with `RotationInProgress` until the result is
/// adopted with [`Catalog::adopt`] or dropped.
pub fn rotate_catalog(catalog: &Catalog, workers: usize) -> Result<RotatedCatalog<'_>> {
    let guard = catalog.begin_rotation()?;
    let source = catalog.open_current()?;

    let key = generate_key();
    let file = format!("{CATALOG_DIR_PREFIX}{}", random_suffix(CATALOG_ID_LENGTH));
    let dir = catalog.root().join(&file);
    tracing::info!(from = %catalog.current_file(), to = %file, "rotating catalog key");

    let records = copy_store(source, &dir, Some(&key), workers)?;

    tracing::info!(file = %file, records, "catalog copy complete");
    Ok(RotatedCatalog {
        file,
        key,
        records,
        dir,
        adopted: false,
        guard,
    })
}

/// Stream all of `source` into a new store at `target_dir`, then close both.
/// Returns the number of pairs written.
pub(crate) fn copy_store(
    source: Engine,
    target_dir: &Path,
    key: Option<&Key>,
    workers: usize,
) -> Result<usize> {
    let mut target = match Engine::open(target_dir, key) {
        Ok(target) => target,
        Err(err) => {
            discard(target_dir);
            return release(source, Err(err), "rotation source");
        }
    };

    let result = export_all(&source, workers).and_then(|values| {
        let mut batch = target.write_batch();
        for (k, v) in values {
            batch.set(k, v);
        }
        batch.flush()
    });

    let result = release(target, result, "rotation target");
    let result = release(source, result, "rotation source");
    if result.is_err() {
        discard(target_dir);
    }
    result
}

fn export_all(source: &Engine, workers: usize) -> Result<HashMap<Vec<u8>, Vec<u8>>> {
    let mut values = HashMap::new();
    source.stream(b"", workers, |batch| {
        values.extend(batch);
        Ok(())
    })?;
    Ok(values)
}

// A leftover `meta-*` directory could win the newest-catalog scan on restart
fn discard(dir: &Path) {
    if let Err(err) = fs::remove_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), error = %err, "could not remove incomplete copy");
    }
}
