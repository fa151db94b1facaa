//! The messaging-platform capability set the bot consumes.
//!
//! The core only ever reads channels, roles and members, creates channels and
//! roles, moves channels, toggles member roles and exchanges messages. It
//! never deletes or renames channels or roles.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    Category,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<String>,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    /// Nickname, else global name, else username.
    pub display_name: String,
    pub role_ids: Vec<String>,
}

impl Member {
    pub fn has_role(&self, role_id: &str) -> bool {
        self.role_ids.iter().any(|r| r == role_id)
    }
}

/// A message the bot received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
}

impl IncomingMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id.clone(),
            message_id: self.id.clone(),
        }
    }
}

/// Handle to a message the bot can react to or delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub color: u32,
    pub field_name: String,
    pub field_value: String,
}

/// Events fed into [`crate::bot::Bot::handle_event`].
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// The event source is connected and the guild is reachable.
    Ready,
    Message(IncomingMessage),
    MemberUpdated { before: Member, after: Member },
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Platform: Send + Sync {
    async fn channels(&self) -> Result<Vec<Channel>>;

    async fn roles(&self) -> Result<Vec<Role>>;

    async fn members(&self) -> Result<Vec<Member>>;

    async fn create_role(&self, name: &str, position: Option<i64>, reason: &str) -> Result<Role>;

    async fn create_channel(
        &self,
        name: &str,
        parent_id: Option<&str>,
        reason: &str,
    ) -> Result<Channel>;

    async fn set_channel_position(&self, channel_id: &str, position: i64) -> Result<()>;

    async fn add_member_role(&self, user_id: &str, role_id: &str, reason: &str) -> Result<()>;

    async fn remove_member_role(&self, user_id: &str, role_id: &str, reason: &str) -> Result<()>;

    /// Whether `user_id` holds administrator permission in the guild.
    async fn is_admin(&self, user_id: &str) -> Result<bool>;

    /// Reply to `to`, mentioning its author.
    async fn reply(&self, to: &IncomingMessage, text: &str) -> Result<MessageRef>;

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<MessageRef>;

    async fn react(&self, message: &MessageRef, emoji: &str) -> Result<()>;

    async fn delete_message(&self, message: &MessageRef) -> Result<()>;
}
