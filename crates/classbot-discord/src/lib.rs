//! `classbot-discord`: Discord REST adapter for `classbot-core`.
//!
//! # Architecture
//!
//! ```text
//! DiscordClient   ← reqwest over https://discord.com/api/v10, one guild
//!     │              implements classbot_core::platform::Platform
//!     ▼
//! EventSource     ← polls command channels and the member list
//!     │              background task + mpsc channel
//!     ▼
//! BotEvent        ← Ready, Message, MemberUpdated; fed to Bot::run
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use classbot_discord::{DiscordClient, EventSource};
//! use std::sync::Arc;
//!
//! let client = Arc::new(DiscordClient::new(token, &config.guild_id)?);
//! let events = EventSource::from_config(client.clone(), &config).spawn();
//! let bot = Arc::new(Bot::new(client, registry, config));
//! bot.run(events).await;
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod wire;


pub use client::DiscordClient;
pub use error::DiscordError;
pub use events::EventSource;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, DiscordError>;
