pub mod classes;
pub mod config;
pub mod plan;
pub mod run;

use anyhow::Context;
use classbot_core::config::BotConfig;
use classbot_core::registry::Registry;
use classbot_core::store::Store;
use std::path::Path;

pub fn load_config(path: &Path) -> anyhow::Result<BotConfig> {
    BotConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))
}

/// Open the ledger named by the config. Shape errors abort here.
pub fn open_registry(config_path: &Path, config: &BotConfig) -> anyhow::Result<Registry> {
    let data_path = config.data_path(config_path);
    let store = Store::open(&data_path)
        .with_context(|| format!("failed to read {}", data_path.display()))?;
    Registry::load(store).with_context(|| format!("invalid class data in {}", data_path.display()))
}
