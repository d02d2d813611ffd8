//! Global config with atomic reload support.
//!
//! `arc-swap` gives lock-free reads and lets the watch loop swap in a new
//! config when `sitepipe.toml` changes.

use crate::config::SiteConfig;
use crate::utils::hash::ContentHash;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::{Arc, LazyLock};

pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

/// Hash of the config file content currently loaded.
static CONFIG_HASH: Mutex<Option<ContentHash>> = Mutex::new(None);

pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

pub fn init_config(config: SiteConfig) -> Arc<SiteConfig> {
    *CONFIG_HASH.lock() = std::fs::read(&config.config_path)
        .ok()
        .map(|content| ContentHash::of(&content));

    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}

/// Reload config from disk if its content changed.
///
/// Returns `Ok(true)` when a new config was installed.
pub fn reload_config() -> Result<bool> {
    let current = cfg();
    let cli = current.cli.context("config was loaded without CLI arguments")?;

    let Ok(content) = std::fs::read(&current.config_path) else {
        return Ok(false);
    };
    let new_hash = ContentHash::of(&content);
    if *CONFIG_HASH.lock() == Some(new_hash) {
        return Ok(false);
    }

    let new_config = SiteConfig::load(cli)?;
    CONFIG.store(Arc::new(new_config));
    *CONFIG_HASH.lock() = Some(new_hash);
    Ok(true)
}
