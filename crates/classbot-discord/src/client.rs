use std::time::Duration;

use async_trait::async_trait;
use classbot_core::platform::{
    Channel, Embed, IncomingMessage, Member, MessageRef, Platform, Role,
};
use reqwest::{header, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DiscordError;
use crate::wire::{
    CreateChannel, CreateMessage, CreateRole, EmbedField, MessageReference, Position,
    WireChannel, WireEmbed, WireGuild, WireMember, WireMessage, WireRole, GUILD_TEXT,
};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/orchard9/classbot, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);
const MEMBER_PAGE: usize = 1000;
pub(crate) const MESSAGE_PAGE: usize = 100;

// ---------------------------------------------------------------------------
// DiscordClient
// ---------------------------------------------------------------------------

/// REST client bound to a single guild.
///
/// Every request carries the `Bot <token>` authorization header. Calls are
/// made once; any non-2xx status, 429 included, becomes
/// [`DiscordError::Status`].
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    guild_id: String,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>, guild_id: impl Into<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, token, guild_id)
    }

    /// Point the client at another API root (a local mock server in tests).
    pub fn with_base_url(
        base_url: &str,
        token: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        let parsed =
            Url::parse(base_url).map_err(|e| DiscordError::BaseUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(DiscordError::BaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url: parsed,
            token: token.into(),
            guild_id: guild_id.into(),
        })
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DiscordError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn guild_url(&self, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["guilds", self.guild_id.as_str()];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        reason: Option<&str>,
    ) -> Result<String> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(header::AUTHORIZATION, format!("Bot {}", self.token));
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(reason) = reason {
            request = request.header("X-Audit-Log-Reason", reason);
        }

        tracing::debug!(%method, url = %url, "discord request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!(url = %url, body = %text, "rate limited by Discord");
            }
            return Err(DiscordError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    async fn get<T: DeserializeOwned>(&self, what: &'static str, url: Url) -> Result<T> {
        let body = self.execute::<()>(Method::GET, url, None, None).await?;
        decode(what, &body)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        what: &'static str,
        method: Method,
        url: Url,
        body: &B,
        reason: Option<&str>,
    ) -> Result<T> {
        let text = self.execute(method, url, Some(body), reason).await?;
        decode(what, &text)
    }

    /// For endpoints that answer 204 No Content.
    async fn send_empty<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        reason: Option<&str>,
    ) -> Result<()> {
        self.execute(method, url, body, reason).await.map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Guild reads
    // -----------------------------------------------------------------------

    pub async fn guild(&self) -> Result<WireGuild> {
        self.get("guild", self.guild_url(&[])?).await
    }

    pub async fn wire_roles(&self) -> Result<Vec<WireRole>> {
        self.get("roles", self.guild_url(&["roles"])?).await
    }

    pub async fn member(&self, user_id: &str) -> Result<WireMember> {
        self.get("member", self.guild_url(&["members", user_id])?)
            .await
    }

    /// All guild members, following `after` pagination.
    pub async fn wire_members(&self) -> Result<Vec<WireMember>> {
        let mut all = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut url = self.guild_url(&["members"])?;
            url.query_pairs_mut()
                .append_pair("limit", &MEMBER_PAGE.to_string());
            if let Some(after) = &after {
                url.query_pairs_mut().append_pair("after", after);
            }
            let page: Vec<WireMember> = self.get("members", url).await?;
            let full = page.len() == MEMBER_PAGE;
            after = page.last().map(|m| m.user.id.clone());
            all.extend(page);
            if !full {
                break;
            }
        }
        Ok(all)
    }

    /// Messages in `channel_id`, newest first. With `after`, only messages
    /// newer than that id.
    pub async fn channel_messages(
        &self,
        channel_id: &str,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<WireMessage>> {
        let mut url = self.url(&["channels", channel_id, "messages"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        if let Some(after) = after {
            url.query_pairs_mut().append_pair("after", after);
        }
        self.get("messages", url).await
    }

    async fn post_message(&self, channel_id: &str, body: &CreateMessage<'_>) -> Result<MessageRef> {
        let url = self.url(&["channels", channel_id, "messages"])?;
        let sent: WireMessage = self
            .send_json("message", Method::POST, url, body, None)
            .await?;
        Ok(MessageRef {
            channel_id: sent.channel_id,
            message_id: sent.id,
        })
    }
}

fn decode<T: DeserializeOwned>(what: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| DiscordError::Decode { what, source })
}

/// Owner, or holder of a role (including `@everyone`, whose id is the guild
/// id) with the administrator bit.
pub fn is_admin(guild: &WireGuild, member: &WireMember, roles: &[WireRole]) -> bool {
    if guild.owner_id == member.user.id {
        return true;
    }
    roles
        .iter()
        .filter(|r| r.id == guild.id || member.roles.contains(&r.id))
        .any(WireRole::is_administrator)
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[async_trait]
impl Platform for DiscordClient {
    async fn channels(&self) -> classbot_core::Result<Vec<Channel>> {
        let channels: Vec<WireChannel> = self
            .get("channels", self.guild_url(&["channels"])?)
            .await?;
        Ok(channels.into_iter().map(Channel::from).collect())
    }

    async fn roles(&self) -> classbot_core::Result<Vec<Role>> {
        Ok(self.wire_roles().await?.into_iter().map(Role::from).collect())
    }

    async fn members(&self) -> classbot_core::Result<Vec<Member>> {
        Ok(self
            .wire_members()
            .await?
            .into_iter()
            .map(Member::from)
            .collect())
    }

    async fn create_role(
        &self,
        name: &str,
        position: Option<i64>,
        reason: &str,
    ) -> classbot_core::Result<Role> {
        let created: WireRole = self
            .send_json(
                "role",
                Method::POST,
                self.guild_url(&["roles"])?,
                &CreateRole { name },
                Some(reason),
            )
            .await?;
        let mut role = Role::from(created);
        if let Some(position) = position {
            let body = [Position {
                id: &role.id,
                position,
            }];
            self.send_empty(Method::PATCH, self.guild_url(&["roles"])?, Some(&body), Some(reason))
                .await?;
            role.position = position;
        }
        tracing::info!(role = %role.name, id = %role.id, "created role");
        Ok(role)
    }

    async fn create_channel(
        &self,
        name: &str,
        parent_id: Option<&str>,
        reason: &str,
    ) -> classbot_core::Result<Channel> {
        let body = CreateChannel {
            name,
            kind: GUILD_TEXT,
            parent_id,
        };
        let created: WireChannel = self
            .send_json(
                "channel",
                Method::POST,
                self.guild_url(&["channels"])?,
                &body,
                Some(reason),
            )
            .await?;
        tracing::info!(channel = name, id = %created.id, "created channel");
        Ok(created.into())
    }

    async fn set_channel_position(
        &self,
        channel_id: &str,
        position: i64,
    ) -> classbot_core::Result<()> {
        let body = [Position {
            id: channel_id,
            position,
        }];
        self.send_empty(Method::PATCH, self.guild_url(&["channels"])?, Some(&body), None)
            .await?;
        Ok(())
    }

    async fn add_member_role(
        &self,
        user_id: &str,
        role_id: &str,
        reason: &str,
    ) -> classbot_core::Result<()> {
        let url = self.guild_url(&["members", user_id, "roles", role_id])?;
        self.send_empty::<()>(Method::PUT, url, None, Some(reason))
            .await?;
        Ok(())
    }

    async fn remove_member_role(
        &self,
        user_id: &str,
        role_id: &str,
        reason: &str,
    ) -> classbot_core::Result<()> {
        let url = self.guild_url(&["members", user_id, "roles", role_id])?;
        self.send_empty::<()>(Method::DELETE, url, None, Some(reason))
            .await?;
        Ok(())
    }

    async fn is_admin(&self, user_id: &str) -> classbot_core::Result<bool> {
        let (guild, member, roles) =
            tokio::try_join!(self.guild(), self.member(user_id), self.wire_roles())?;
        Ok(is_admin(&guild, &member, &roles))
    }

    async fn reply(&self, to: &IncomingMessage, text: &str) -> classbot_core::Result<MessageRef> {
        let body = CreateMessage {
            content: Some(text),
            message_reference: Some(MessageReference { message_id: &to.id }),
            ..Default::default()
        };
        Ok(self.post_message(&to.channel_id, &body).await?)
    }

    async fn send_embed(
        &self,
        channel_id: &str,
        embed: &Embed,
    ) -> classbot_core::Result<MessageRef> {
        let body = CreateMessage {
            embeds: vec![WireEmbed {
                color: embed.color,
                fields: vec![EmbedField {
                    name: &embed.field_name,
                    value: &embed.field_value,
                }],
            }],
            ..Default::default()
        };
        Ok(self.post_message(channel_id, &body).await?)
    }

    async fn react(&self, message: &MessageRef, emoji: &str) -> classbot_core::Result<()> {
        let url = self.url(&[
            "channels",
            &message.channel_id,
            "messages",
            &message.message_id,
            "reactions",
            emoji,
            "@me",
        ])?;
        self.send_empty::<()>(Method::PUT, url, None, None).await?;
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> classbot_core::Result<()> {
        let url = self.url(&["channels", &message.channel_id, "messages", &message.message_id])?;
        self.send_empty::<()>(Method::DELETE, url, None, None)
            .await?;
        Ok(())
    }
}
