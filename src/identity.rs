// src/identity.rs
//! Local identity used to seed the bootstrap lock store
//!
//! A keypair is written once as `key.pem` / `public.pem`. The only thing the
//! rest of the crate takes from it is [`Identity::derive_local_secret`]: the
//! SHA-256 of the private key file, as hex, cut to the requested length.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::consts::{PADDING_CHARS, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
use crate::error::{Result, StoreError};

pub trait Identity {
    /// Create the keypair. Existing files are refused unless `overwrite`,
    /// in which case they are renamed to timestamped backups first.
    fn generate_identity(&self, overwrite: bool) -> Result<()>;

    fn derive_local_secret(&self, length: usize) -> Result<String>;
}

/// Ed25519 keypair stored as PKCS#8 / SPKI PEM files in one directory
pub struct FileIdentity {
    dir: PathBuf,
}

impl FileIdentity {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileIdentity { dir: dir.into() }
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.dir.join(PRIVATE_KEY_FILE)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.dir.join(PUBLIC_KEY_FILE)
    }

    pub fn read_keypair(&self) -> Result<(SigningKey, VerifyingKey)> {
        let private_pem = read_pem(&self.private_key_path(), "private key")?;
        let public_pem = read_pem(&self.public_key_path(), "public key")?;

        let signing = SigningKey::from_pkcs8_pem(&private_pem)
            .map_err(|e| StoreError::Identity(format!("bad private key: {e}")))?;
        let verifying = VerifyingKey::from_public_key_pem(&public_pem)
            .map_err(|e| StoreError::Identity(format!("bad public key: {e}")))?;
        Ok((signing, verifying))
    }

    /// Hex SHA-256 of the private key file
    pub fn hash_private_key(&self) -> Result<String> {
        let path = self.private_key_path();
        let mut file = File::open(&path).map_err(|e| missing_or_io(e, &path, "private key"))?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    }

    fn backup_existing(&self) -> Result<()> {
        let stamp = chrono::Utc::now().timestamp();
        for path in [self.private_key_path(), self.public_key_path()] {
            if path.exists() {
                let mut backup = path.clone().into_os_string();
                backup.push(format!(".{stamp}"));
                fs::rename(&path, &backup)?;
                tracing::info!(from = %path.display(), "identity file moved aside");
            }
        }
        Ok(())
    }
}

impl Identity for FileIdentity {
    fn generate_identity(&self, overwrite: bool) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        if self.private_key_path().exists() || self.public_key_path().exists() {
            if !overwrite {
                return Err(StoreError::Identity(
                    "target file(s) already exist".to_string(),
                ));
            }
            self.backup_existing()?;
        }

        let signing = SigningKey::from_bytes(&rand::random::<[u8; 32]>());
        let private_pem = signing
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| StoreError::Identity(format!("encode private key: {e}")))?;
        let public_pem = signing
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| StoreError::Identity(format!("encode public key: {e}")))?;

        write_key_file(&self.private_key_path(), private_pem.as_bytes(), 0o600)?;
        write_key_file(&self.public_key_path(), public_pem.as_bytes(), 0o644)?;

        tracing::debug!(dir = %self.dir.display(), "generated identity keypair");
        Ok(())
    }

    fn derive_local_secret(&self, length: usize) -> Result<String> {
        extract_string(&self.hash_private_key()?, length)
    }
}

/// Exactly `length` chars of `source`, padded from a fixed cycle of
/// symbols when it is short. The same input always gives the same output.
pub fn extract_string(source: &str, length: usize) -> Result<String> {
    if length == 0 {
        return Err(StoreError::InvalidArgument(
            "derived secret length must be positive".to_string(),
        ));
    }

    let padding = PADDING_CHARS.iter().map(|&b| b as char).cycle();
    Ok(source.chars().chain(padding).take(length).collect())
}

fn read_pem(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| missing_or_io(e, path, what))
}

fn missing_or_io(err: io::Error, path: &Path, what: &str) -> StoreError {
    if err.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(format!("{what} {}", path.display()))
    } else {
        StoreError::Io(err)
    }
}

fn write_key_file(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}
