use crate::cmd::{load_config, open_registry};
use anyhow::Context;
use classbot_core::bot::Bot;
use classbot_core::config::WarnLevel;
use classbot_discord::{DiscordClient, EventSource};
use std::path::Path;
use std::sync::Arc;

pub fn run(config_path: &Path, token: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    for w in config.validate() {
        match w.level {
            WarnLevel::Error => anyhow::bail!("invalid config: {}", w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }
    let registry = open_registry(config_path, &config)?;
    tracing::info!(
        classes = registry.list().len(),
        data = %registry.store().path().display(),
        "loaded managed classes"
    );

    let client = Arc::new(
        DiscordClient::new(token, &config.guild_id).context("failed to build Discord client")?,
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let events = EventSource::from_config(client.clone(), &config).spawn();
        let bot = Arc::new(Bot::new(client, registry, config));
        tracing::info!("classbot running, press Ctrl-C to stop");

        tokio::select! {
            _ = bot.run(events) => {}
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                tracing::info!("interrupted, shutting down");
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}
