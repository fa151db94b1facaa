use crate::error::{ClassbotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "classbot.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// TaggingConfig
// ---------------------------------------------------------------------------

/// Keeps `role_name` assigned to exactly the members whose visible name is
/// `display_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    pub display_name: String,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default = "default_tag_pause_ms")]
    pub pause_ms: u64,
}

fn default_tag_pause_ms() -> u64 {
    1000
}

impl TaggingConfig {
    /// The role defaults to the display name itself.
    pub fn role_name(&self) -> &str {
        self.role_name.as_deref().unwrap_or(&self.display_name)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

// ---------------------------------------------------------------------------
// BotConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub guild_id: String,
    /// Channels polled for commands.
    #[serde(default)]
    pub command_channels: Vec<String>,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Category that class channels are created under.
    #[serde(default = "default_class_category")]
    pub class_category: String,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    #[serde(default = "default_reply_ttl_secs")]
    pub reply_ttl_secs: u64,
    /// Re-sort the class category by name after creating channels.
    #[serde(default = "default_reorder_channels")]
    pub reorder_channels: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_member_poll_secs")]
    pub member_poll_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagging: Option<TaggingConfig>,
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_class_category() -> String {
    "course-specific".to_string()
}

fn default_confirm_timeout_secs() -> u64 {
    15
}

fn default_reply_ttl_secs() -> u64 {
    4
}

fn default_reorder_channels() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_member_poll_secs() -> u64 {
    60
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            guild_id: String::new(),
            command_channels: Vec::new(),
            data_file: default_data_file(),
            class_category: default_class_category(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            reply_ttl_secs: default_reply_ttl_secs(),
            reorder_channels: default_reorder_channels(),
            poll_interval_ms: default_poll_interval_ms(),
            member_poll_secs: default_member_poll_secs(),
            tagging: None,
        }
    }
}

impl BotConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ClassbotError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: BotConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// `data_file` resolved against the directory holding the config file.
    pub fn data_path(&self, config_path: &Path) -> PathBuf {
        if self.data_file.is_absolute() {
            return self.data_file.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.data_file),
            None => self.data_file.clone(),
        }
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn reply_ttl(&self) -> Duration {
        Duration::from_secs(self.reply_ttl_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn member_poll_interval(&self) -> Duration {
        Duration::from_secs(self.member_poll_secs)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message })
        };

        if self.prefix.trim().is_empty() {
            push(WarnLevel::Error, "prefix is empty".to_string());
        }
        if self.guild_id.trim().is_empty() {
            push(WarnLevel::Error, "guild_id is not set".to_string());
        }
        if self.command_channels.is_empty() {
            push(
                WarnLevel::Warning,
                "no command_channels configured; the bot will not see any commands".to_string(),
            );
        }
        if self.class_category.trim().is_empty() {
            push(
                WarnLevel::Warning,
                "class_category is empty; class channels will be created without a parent"
                    .to_string(),
            );
        }
        if self.confirm_timeout_secs == 0 {
            push(
                WarnLevel::Error,
                "confirm_timeout_secs is 0; ingestion can never be confirmed".to_string(),
            );
        }
        if self.poll_interval_ms == 0 {
            push(WarnLevel::Error, "poll_interval_ms must be positive".to_string());
        } else if self.poll_interval_ms < 500 {
            push(
                WarnLevel::Warning,
                format!(
                    "poll_interval_ms={} is very low and will hit rate limits",
                    self.poll_interval_ms
                ),
            );
        }
        if self.member_poll_secs == 0 {
            push(WarnLevel::Error, "member_poll_secs must be positive".to_string());
        }
        if let Some(tagging) = &self.tagging {
            if tagging.display_name.trim().is_empty() {
                push(WarnLevel::Error, "tagging.display_name is empty".to_string());
            }
            if tagging.role_name().trim().is_empty() {
                push(WarnLevel::Error, "tagging.role_name is empty".to_string());
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
