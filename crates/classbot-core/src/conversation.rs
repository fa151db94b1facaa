//! Reply helpers and the table of users the bot is waiting to hear from.

use crate::error::Result;
use crate::platform::{IncomingMessage, Platform};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

pub const SUCCESS_EMOJI: &str = "✅";
pub const FAILURE_EMOJI: &str = "❌";

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

pub async fn success(platform: &dyn Platform, msg: &IncomingMessage) -> Result<()> {
    platform.react(&msg.message_ref(), SUCCESS_EMOJI).await
}

/// Reply with `text`, then mark the command as done.
pub async fn success_with(
    platform: &dyn Platform,
    msg: &IncomingMessage,
    text: &str,
) -> Result<()> {
    platform.reply(msg, text).await?;
    success(platform, msg).await
}

/// React with the failure mark and, if given, reply with `reason`. With a
/// `ttl` the reply deletes itself after that long.
pub async fn failure(
    platform: &dyn Platform,
    msg: &IncomingMessage,
    reason: Option<&str>,
    ttl: Option<Duration>,
) -> Result<()> {
    platform.react(&msg.message_ref(), FAILURE_EMOJI).await?;
    match (reason, ttl) {
        (Some(reason), Some(ttl)) => self_destructing_reply(platform, msg, reason, ttl).await,
        (Some(reason), None) => platform.reply(msg, reason).await.map(|_| ()),
        (None, _) => Ok(()),
    }
}

pub async fn self_destructing_reply(
    platform: &dyn Platform,
    msg: &IncomingMessage,
    text: &str,
    ttl: Duration,
) -> Result<()> {
    let sent = platform.reply(msg, text).await?;
    tokio::time::sleep(ttl).await;
    platform.delete_message(&sent).await
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

pub fn inline_code(contents: impl std::fmt::Display) -> String {
    format!("`{contents}`")
}

pub fn block_code(contents: &str, language: Option<&str>) -> String {
    format!("```{}\n{}\n```", language.unwrap_or(""), contents)
}

// ---------------------------------------------------------------------------
// Waiters
// ---------------------------------------------------------------------------

/// How a wait for the next message ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Awaited {
    Reply(IncomingMessage),
    /// A newer wait for the same user and channel took over.
    Superseded,
    TimedOut,
}

/// Pending "next message from this user in this channel" requests.
///
/// A message that satisfies a waiter is consumed by it and never parsed as a
/// command. Registering again for the same user and channel replaces the
/// older waiter, whose receiver then closes.
#[derive(Default)]
pub struct Waiters {
    inner: Mutex<WaiterTable>,
}

type WaiterKey = (String, String);

#[derive(Default)]
struct WaiterTable {
    next_token: u64,
    pending: HashMap<WaiterKey, (u64, oneshot::Sender<IncomingMessage>)>,
}

impl Waiters {
    /// Returns the registration token along with the receiver. Pass the token
    /// to [`Waiters::cancel`].
    pub fn register(
        &self,
        channel_id: &str,
        author_id: &str,
    ) -> (u64, oneshot::Receiver<IncomingMessage>) {
        let (tx, rx) = oneshot::channel();
        let mut table = self.lock();
        table.next_token += 1;
        let token = table.next_token;
        table
            .pending
            .insert((channel_id.to_string(), author_id.to_string()), (token, tx));
        (token, rx)
    }

    /// Drop the waiter registered under `token`. A newer registration for the
    /// same key is left alone.
    pub fn cancel(&self, channel_id: &str, author_id: &str, token: u64) {
        let key = (channel_id.to_string(), author_id.to_string());
        let mut table = self.lock();
        if table.pending.get(&key).is_some_and(|(t, _)| *t == token) {
            table.pending.remove(&key);
        }
    }

    pub fn is_waiting(&self, channel_id: &str, author_id: &str) -> bool {
        self.lock()
            .pending
            .contains_key(&(channel_id.to_string(), author_id.to_string()))
    }

    /// Hand `msg` to the waiter for its channel and author. Gives the message
    /// back when nobody is waiting for it.
    pub fn deliver(&self, msg: IncomingMessage) -> Option<IncomingMessage> {
        let key = (msg.channel_id.clone(), msg.author_id.clone());
        let Some((_, tx)) = self.lock().pending.remove(&key) else {
            return Some(msg);
        };
        // A dropped receiver means the wait already timed out.
        tx.send(msg).err()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WaiterTable> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
