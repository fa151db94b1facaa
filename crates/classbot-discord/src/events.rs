use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use classbot_core::config::BotConfig;
use classbot_core::platform::{BotEvent, IncomingMessage, Member};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::client::{DiscordClient, MESSAGE_PAGE};
use crate::wire::WireMessage;

// ---------------------------------------------------------------------------
// EventSource
// ---------------------------------------------------------------------------

/// Polls the guild and turns what changed into [`BotEvent`]s.
///
/// A background task owns the poll state and forwards events over a Tokio
/// mpsc channel. Dropping the receiver stops the task at its next tick.
pub struct EventSource {
    client: Arc<DiscordClient>,
    channels: Vec<String>,
    poll_interval: Duration,
    member_interval: Duration,
}

impl EventSource {
    pub fn new(
        client: Arc<DiscordClient>,
        channels: Vec<String>,
        poll_interval: Duration,
        member_interval: Duration,
    ) -> Self {
        Self {
            client,
            channels,
            poll_interval,
            member_interval,
        }
    }

    pub fn from_config(client: Arc<DiscordClient>, config: &BotConfig) -> Self {
        Self::new(
            client,
            config.command_channels.clone(),
            config.poll_interval(),
            config.member_poll_interval(),
        )
    }

    /// Start polling. The first event is always [`BotEvent::Ready`].
    pub fn spawn(self) -> mpsc::Receiver<BotEvent> {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(self.run(tx));
        rx
    }

    async fn run(self, tx: mpsc::Sender<BotEvent>) {
        let mut cursors: HashMap<String, Option<String>> = HashMap::new();
        for channel in &self.channels {
            self.baseline(channel, &mut cursors).await;
        }
        let mut members = match self.client.wire_members().await {
            Ok(list) => snapshot(list.into_iter().map(Member::from)),
            Err(e) => {
                tracing::warn!(error = %e, "could not list members, rename tracking starts empty");
                HashMap::new()
            }
        };

        if tx.send(BotEvent::Ready).await.is_err() {
            return;
        }

        let mut message_tick = tokio::time::interval(self.poll_interval);
        let mut member_tick = tokio::time::interval(self.member_interval);
        message_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        member_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Both fire immediately; the baseline above already covers that.
        message_tick.tick().await;
        member_tick.tick().await;

        loop {
            let events = tokio::select! {
                _ = message_tick.tick() => self.poll_messages(&mut cursors).await,
                _ = member_tick.tick() => self.poll_members(&mut members).await,
                _ = tx.closed() => break,
            };
            for event in events {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        }
        tracing::debug!("event receiver dropped, poller exiting");
    }

    /// Record the newest message id so history is never replayed.
    async fn baseline(&self, channel: &str, cursors: &mut HashMap<String, Option<String>>) {
        match self.client.channel_messages(channel, None, 1).await {
            Ok(latest) => {
                cursors.insert(channel.to_string(), latest.first().map(|m| m.id.clone()));
            }
            Err(e) => tracing::warn!(channel, error = %e, "could not read channel baseline"),
        }
    }

    async fn poll_messages(&self, cursors: &mut HashMap<String, Option<String>>) -> Vec<BotEvent> {
        let mut events = Vec::new();
        for channel in &self.channels {
            let Some(cursor) = cursors.get_mut(channel) else {
                // Baseline failed earlier; retry it instead of replaying history.
                self.baseline(channel, cursors).await;
                continue;
            };
            match self
                .client
                .channel_messages(channel, cursor.as_deref(), MESSAGE_PAGE)
                .await
            {
                Ok(batch) => {
                    events.extend(advance(cursor, batch).into_iter().map(BotEvent::Message))
                }
                Err(e) => tracing::warn!(channel, error = %e, "message poll failed"),
            }
        }
        events
    }

    async fn poll_members(&self, members: &mut HashMap<String, Member>) -> Vec<BotEvent> {
        match self.client.wire_members().await {
            Ok(list) => {
                let current: Vec<Member> = list.into_iter().map(Member::from).collect();
                let events = renames(members, &current);
                *members = snapshot(current);
                events
            }
            Err(e) => {
                tracing::warn!(error = %e, "member poll failed");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

fn snapshot(members: impl IntoIterator<Item = Member>) -> HashMap<String, Member> {
    members
        .into_iter()
        .map(|m| (m.user_id.clone(), m))
        .collect()
}

/// Snowflakes grow monotonically; compare numerically, falling back to
/// length-then-lexical for anything unparsable.
fn snowflake_key(id: &str) -> (u64, usize, &str) {
    (id.parse().unwrap_or(u64::MAX), id.len(), id)
}

/// Move `cursor` past `batch` and return its human-authored messages oldest
/// first.
pub(crate) fn advance(
    cursor: &mut Option<String>,
    mut batch: Vec<WireMessage>,
) -> Vec<IncomingMessage> {
    batch.sort_by(|a, b| snowflake_key(&a.id).cmp(&snowflake_key(&b.id)));
    if let Some(newest) = batch.last() {
        *cursor = Some(newest.id.clone());
    }
    batch
        .into_iter()
        .filter(|m| !m.author.bot)
        .map(IncomingMessage::from)
        .collect()
}

/// Members present in both snapshots whose visible name changed.
pub(crate) fn renames(previous: &HashMap<String, Member>, current: &[Member]) -> Vec<BotEvent> {
    current
        .iter()
        .filter_map(|after| {
            let before = previous.get(&after.user_id)?;
            (before.display_name != after.display_name).then(|| BotEvent::MemberUpdated {
                before: before.clone(),
                after: after.clone(),
            })
        })
        .collect()
}
