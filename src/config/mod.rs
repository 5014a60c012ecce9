// src/config/mod.rs
//! Configuration system for encrypted-kv-catalog
//!
//! TOML file + env overrides, loaded on demand and passed explicitly.

pub use app::{load, Config, Features, Paths, Rotation, Secrets};

mod app;
mod defaults;

pub use defaults::{CONFIG_PATH_ENV, DEFAULT_STORE_PATH, STORE_PATH_ENV};
