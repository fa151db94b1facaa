//! In-memory platform used by unit tests.

use crate::error::{ClassbotError, Result};
use crate::platform::{
    Channel, ChannelKind, Embed, IncomingMessage, Member, MessageRef, Platform, Role,
};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub(crate) struct FakeState {
    pub channels: Vec<Channel>,
    pub roles: Vec<Role>,
    pub members: Vec<Member>,
    pub admins: Vec<String>,
    /// (message replied to, text)
    pub replies: Vec<(String, String)>,
    pub embeds: Vec<(String, Embed)>,
    pub reactions: Vec<(String, String)>,
    pub deleted: Vec<String>,
    pub moves: Vec<(String, i64)>,
    pub role_changes: Vec<String>,
    pub fail_channel: Option<String>,
    pub fail_role: Option<String>,
    next_id: u64,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

#[derive(Default)]
pub(crate) struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn with_category(self, name: &str) -> Self {
        let id = format!("cat-{name}");
        self.state().channels.push(Channel {
            id,
            name: name.to_string(),
            kind: ChannelKind::Category,
            parent_id: None,
            position: 0,
        });
        self
    }

    pub fn with_channel(self, name: &str, parent: Option<&str>, position: i64) -> Self {
        self.state().channels.push(Channel {
            id: format!("ch-{name}"),
            name: name.to_string(),
            kind: ChannelKind::Text,
            parent_id: parent.map(|p| format!("cat-{p}")),
            position,
        });
        self
    }

    pub fn with_role(self, name: &str) -> Self {
        let mut state = self.state();
        let position = state.roles.len() as i64;
        state.roles.push(Role {
            id: format!("role-{name}"),
            name: name.to_string(),
            position,
        });
        drop(state);
        self
    }

    pub fn with_member(self, user_id: &str, display_name: &str, role_ids: &[&str]) -> Self {
        self.state().members.push(Member {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            role_ids: role_ids.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    pub fn with_admin(self, user_id: &str) -> Self {
        self.state().admins.push(user_id.to_string());
        self
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.state().channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn role_names(&self) -> Vec<String> {
        self.state().roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.state().replies.iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn reactions_on(&self, message_id: &str) -> Vec<String> {
        self.state()
            .reactions
            .iter()
            .filter(|(m, _)| m == message_id)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn channels(&self) -> Result<Vec<Channel>> {
        Ok(self.state().channels.clone())
    }

    async fn roles(&self) -> Result<Vec<Role>> {
        Ok(self.state().roles.clone())
    }

    async fn members(&self) -> Result<Vec<Member>> {
        Ok(self.state().members.clone())
    }

    async fn create_role(&self, name: &str, position: Option<i64>, _reason: &str) -> Result<Role> {
        let mut state = self.state();
        if state.fail_role.as_deref() == Some(name) {
            return Err(ClassbotError::Platform(format!("cannot create role {name}")));
        }
        let role = Role {
            id: state.next_id("role-"),
            name: name.to_string(),
            position: position.unwrap_or(1),
        };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn create_channel(
        &self,
        name: &str,
        parent_id: Option<&str>,
        _reason: &str,
    ) -> Result<Channel> {
        let mut state = self.state();
        if state.fail_channel.as_deref() == Some(name) {
            return Err(ClassbotError::Platform(format!("cannot create channel {name}")));
        }
        let position = state
            .channels
            .iter()
            .filter(|c| c.parent_id.as_deref() == parent_id && c.kind == ChannelKind::Text)
            .count() as i64;
        let channel = Channel {
            id: state.next_id("ch-"),
            name: name.to_string(),
            kind: ChannelKind::Text,
            parent_id: parent_id.map(str::to_string),
            position,
        };
        state.channels.push(channel.clone());
        Ok(channel)
    }

    async fn set_channel_position(&self, channel_id: &str, position: i64) -> Result<()> {
        let mut state = self.state();
        state.moves.push((channel_id.to_string(), position));
        if let Some(c) = state.channels.iter_mut().find(|c| c.id == channel_id) {
            c.position = position;
        }
        Ok(())
    }

    async fn add_member_role(&self, user_id: &str, role_id: &str, _reason: &str) -> Result<()> {
        let mut state = self.state();
        state.role_changes.push(format!("+{user_id}:{role_id}"));
        let member = state
            .members
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .ok_or_else(|| ClassbotError::Platform(format!("unknown member {user_id}")))?;
        member.role_ids.push(role_id.to_string());
        Ok(())
    }

    async fn remove_member_role(&self, user_id: &str, role_id: &str, _reason: &str) -> Result<()> {
        let mut state = self.state();
        state.role_changes.push(format!("-{user_id}:{role_id}"));
        let member = state
            .members
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .ok_or_else(|| ClassbotError::Platform(format!("unknown member {user_id}")))?;
        member.role_ids.retain(|r| r != role_id);
        Ok(())
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool> {
        Ok(self.state().admins.iter().any(|a| a == user_id))
    }

    async fn reply(&self, to: &IncomingMessage, text: &str) -> Result<MessageRef> {
        let mut state = self.state();
        state.replies.push((to.id.clone(), text.to_string()));
        Ok(MessageRef {
            channel_id: to.channel_id.clone(),
            message_id: state.next_id("reply-"),
        })
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<MessageRef> {
        let mut state = self.state();
        state.embeds.push((channel_id.to_string(), embed.clone()));
        Ok(MessageRef {
            channel_id: channel_id.to_string(),
            message_id: state.next_id("embed-"),
        })
    }

    async fn react(&self, message: &MessageRef, emoji: &str) -> Result<()> {
        self.state()
            .reactions
            .push((message.message_id.clone(), emoji.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<()> {
        self.state().deleted.push(message.message_id.clone());
        Ok(())
    }
}

pub(crate) fn message(id: &str, author_id: &str, content: &str) -> IncomingMessage {
    IncomingMessage {
        id: id.to_string(),
        channel_id: "general".to_string(),
        author_id: author_id.to_string(),
        content: content.to_string(),
    }
}

/// A bot over a fresh data file in `dir`, with instant reply self-destruct.
pub(crate) fn test_bot(
    dir: &tempfile::TempDir,
    platform: FakePlatform,
) -> (std::sync::Arc<crate::bot::Bot>, std::sync::Arc<FakePlatform>) {
    use crate::config::BotConfig;
    use crate::registry::Registry;
    use crate::store::Store;

    let platform = std::sync::Arc::new(platform);
    let registry = Registry::load(Store::open(dir.path().join("data.json")).unwrap()).unwrap();
    let config = BotConfig {
        guild_id: "g".into(),
        reply_ttl_secs: 0,
        confirm_timeout_secs: 1,
        ..BotConfig::default()
    };
    let bot = std::sync::Arc::new(crate::bot::Bot::new(platform.clone(), registry, config));
    (bot, platform)
}
