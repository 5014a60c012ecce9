// src/config/app.rs
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::defaults::*;
use crate::enums::SecretBackend;
use crate::error::Result;

/// Process configuration: where stores live and how keys are kept
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_paths")]
    pub paths: Paths,
    #[serde(default = "default_secrets")]
    pub secrets: Secrets,
    #[serde(default = "default_features")]
    pub features: Features,
    #[serde(default = "default_rotation")]
    pub rotation: Rotation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paths {
    /// Store root: one directory per logical database plus `meta-*` catalogs
    pub store: PathBuf,
    /// Directory holding the identity keypair
    pub keys: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Secrets {
    pub backend: SecretBackend,
    pub service: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Features {
    /// Seed for `secure_new_db` when a catalog is first initialized
    pub secure_new_db: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rotation {
    pub export_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: default_paths(),
            secrets: default_secrets(),
            features: default_features(),
            rotation: default_rotation(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Load config at runtime, falling back to defaults if the file is missing
///
/// `EKC_CONFIG` names the TOML file (default `ekc-config.toml`);
/// `EKC_STORE_PATH` overrides `[paths] store`.
pub fn load() -> Result<Config> {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

    let mut conf = if Path::new(&config_path).exists() {
        Config::from_file(Path::new(&config_path))?
    } else {
        tracing::warn!(path = %config_path, "config file not found, using built-in defaults");
        Config::default()
    };

    if let Ok(store) = std::env::var(STORE_PATH_ENV) {
        conf.paths.store = PathBuf::from(store);
    }

    Ok(conf)
}
