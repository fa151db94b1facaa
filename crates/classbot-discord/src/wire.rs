//! Discord REST payloads, decoded into the core's platform entities.

use classbot_core::platform::{Channel, ChannelKind, IncomingMessage, Member, Role};
use serde::{Deserialize, Serialize};

pub const GUILD_TEXT: u8 = 0;
pub const GUILD_CATEGORY: u8 = 4;
pub const ADMINISTRATOR: u64 = 0x8;

#[derive(Debug, Clone, Deserialize)]
pub struct WireChannel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub position: i64,
}

impl From<WireChannel> for Channel {
    fn from(w: WireChannel) -> Self {
        let kind = match w.kind {
            GUILD_TEXT => ChannelKind::Text,
            GUILD_CATEGORY => ChannelKind::Category,
            _ => ChannelKind::Other,
        };
        Channel {
            id: w.id,
            name: w.name.unwrap_or_default(),
            kind,
            parent_id: w.parent_id,
            position: w.position,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireRole {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: i64,
    /// Permission bitfield, serialized as a decimal string.
    #[serde(default)]
    pub permissions: String,
}

impl WireRole {
    pub fn is_administrator(&self) -> bool {
        self.permissions
            .parse::<u64>()
            .is_ok_and(|bits| bits & ADMINISTRATOR != 0)
    }
}

impl From<WireRole> for Role {
    fn from(w: WireRole) -> Self {
        Role {
            id: w.id,
            name: w.name,
            position: w.position,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMember {
    pub user: WireUser,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl WireMember {
    /// Guild nickname, then global name, then username.
    pub fn display_name(&self) -> &str {
        self.nick
            .as_deref()
            .or(self.user.global_name.as_deref())
            .unwrap_or(&self.user.username)
    }
}

impl From<WireMember> for Member {
    fn from(w: WireMember) -> Self {
        Member {
            display_name: w.display_name().to_string(),
            user_id: w.user.id,
            role_ids: w.roles,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireGuild {
    pub id: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub id: String,
    pub channel_id: String,
    pub author: WireUser,
    #[serde(default)]
    pub content: String,
}

impl From<WireMessage> for IncomingMessage {
    fn from(w: WireMessage) -> Self {
        IncomingMessage {
            id: w.id,
            channel_id: w.channel_id,
            author_id: w.author.id,
            content: w.content,
        }
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CreateRole<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateChannel<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct Position<'a> {
    pub id: &'a str,
    pub position: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageReference<'a> {
    pub message_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EmbedField<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub struct WireEmbed<'a> {
    pub color: u32,
    pub fields: Vec<EmbedField<'a>>,
}

#[derive(Debug, Default, Serialize)]
pub struct CreateMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<WireEmbed<'a>>,
}
