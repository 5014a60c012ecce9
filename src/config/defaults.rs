// src/config/defaults.rs
use std::path::PathBuf;

use crate::config::app::{Features, Paths, Rotation, Secrets};
use crate::consts::{DEFAULT_EXPORT_WORKERS, DEFAULT_SECRET_SERVICE};
use crate::enums::SecretBackend;

pub const CONFIG_PATH_ENV: &str = "EKC_CONFIG";
pub const STORE_PATH_ENV: &str = "EKC_STORE_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "ekc-config.toml";
pub const DEFAULT_STORE_PATH: &str = "./store/";

pub fn default_paths() -> Paths {
    Paths {
        store: PathBuf::from(DEFAULT_STORE_PATH),
        keys: dirs::config_dir()
            .map(|dir| dir.join("encrypted-kv-catalog"))
            .unwrap_or_else(|| PathBuf::from("./keys")),
    }
}

pub fn default_secrets() -> Secrets {
    Secrets {
        backend: SecretBackend::Keyring,
        service: DEFAULT_SECRET_SERVICE.into(),
    }
}

pub fn default_features() -> Features {
    Features {
        secure_new_db: true,
    }
}

pub fn default_rotation() -> Rotation {
    Rotation {
        export_workers: DEFAULT_EXPORT_WORKERS,
    }
}
