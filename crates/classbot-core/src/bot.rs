use crate::command::{self, Invocation, Permission};
use crate::config::BotConfig;
use crate::conversation::{self, Awaited, Waiters};
use crate::error::Result;
use crate::handlers;
use crate::platform::{BotEvent, IncomingMessage, Platform};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::registry::Registry;
use crate::tagging;
use crate::types::ManagedClass;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

const NO_PERMISSION: &str = "Sorry, but you do not have permission to run this command.";

/// Everything a command needs: the platform, the registry, the config and the
/// table of pending confirmations. Constructed once at startup and shared.
pub struct Bot {
    platform: Arc<dyn Platform>,
    registry: RwLock<Registry>,
    waiters: Waiters,
    config: BotConfig,
}

impl Bot {
    pub fn new(platform: Arc<dyn Platform>, registry: Registry, config: BotConfig) -> Self {
        Self {
            platform,
            registry: RwLock::new(registry),
            waiters: Waiters::default(),
            config,
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn waiters(&self) -> &Waiters {
        &self.waiters
    }

    // -----------------------------------------------------------------------
    // Registry access
    // -----------------------------------------------------------------------

    pub async fn classes(&self) -> Vec<ManagedClass> {
        self.registry.read().await.list().to_vec()
    }

    pub async fn add_classes(&self, classes: Vec<ManagedClass>) -> Result<()> {
        self.registry.write().await.add(classes)
    }

    pub async fn remove_classes(&self, classes: &[ManagedClass]) -> Result<usize> {
        self.registry.write().await.remove(classes)
    }

    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let classes = self.classes().await;
        Reconciler::new(
            self.platform(),
            &self.config.class_category,
            self.config.reorder_channels,
        )
        .reconcile(&classes)
        .await
    }

    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------

    /// Wait up to `window` for the next message from the author of `to` in
    /// the same channel.
    pub async fn await_reply(&self, to: &IncomingMessage, window: Duration) -> Awaited {
        let (token, rx) = self.waiters.register(&to.channel_id, &to.author_id);
        match tokio::time::timeout(window, rx).await {
            Ok(Ok(reply)) => Awaited::Reply(reply),
            Ok(Err(_)) => Awaited::Superseded,
            Err(_) => {
                self.waiters.cancel(&to.channel_id, &to.author_id, token);
                Awaited::TimedOut
            }
        }
    }

    pub async fn fail(&self, msg: &IncomingMessage, reason: &str) -> Result<()> {
        let ttl = self.config.reply_ttl();
        conversation::failure(self.platform(), msg, Some(reason), Some(ttl)).await
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    /// Route events until the sender side closes.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<BotEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        tracing::info!("event source closed, shutting down");
    }

    /// Dispatch one event. Long-running work is spawned so the router never
    /// blocks on a command.
    pub fn handle_event(self: &Arc<Self>, event: BotEvent) {
        match event {
            BotEvent::Ready => {
                tracing::info!(guild = %self.config.guild_id, "bot ready");
                if let Some(cfg) = self.config.tagging.clone() {
                    let bot = Arc::clone(self);
                    tokio::spawn(async move {
                        if let Err(e) = tagging::sweep(bot.platform(), &cfg).await {
                            tracing::error!(error = %e, "tagging sweep failed");
                        }
                    });
                }
            }
            BotEvent::Message(msg) => self.route_message(msg),
            BotEvent::MemberUpdated { before, after } => {
                let Some(cfg) = self.config.tagging.clone() else {
                    return;
                };
                let bot = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(e) =
                        tagging::handle_member_update(bot.platform(), &cfg, &before, &after).await
                    {
                        tracing::error!(error = %e, user = %after.user_id, "member update failed");
                    }
                });
            }
        }
    }

    fn route_message(self: &Arc<Self>, msg: IncomingMessage) {
        let Some(msg) = self.waiters.deliver(msg) else {
            tracing::debug!("message consumed by a pending conversation");
            return;
        };
        let Some(invocation) = command::parse(&self.config.prefix, &msg.content) else {
            return;
        };
        let bot = Arc::clone(self);
        tokio::spawn(async move { bot.dispatch(&invocation, &msg).await });
    }

    /// Run a command and turn any error into a log line plus the failure
    /// reaction. Never panics or propagates.
    pub async fn dispatch(&self, invocation: &Invocation, msg: &IncomingMessage) {
        tracing::debug!(command = %invocation, author = %msg.author_id, "dispatching");
        if let Err(e) = self.execute(invocation, msg).await {
            tracing::error!(command = %invocation.name, error = %e, "command failed");
            let _ = conversation::failure(self.platform(), msg, None, None).await;
        }
    }

    /// Look up, permission-check and run a command.
    pub async fn execute(&self, invocation: &Invocation, msg: &IncomingMessage) -> Result<()> {
        let Some(spec) = command::lookup(&invocation.name) else {
            tracing::debug!(command = %invocation.name, "unknown command");
            return conversation::failure(self.platform(), msg, None, None).await;
        };

        if spec.permission == Permission::Admin && !self.platform.is_admin(&msg.author_id).await? {
            return self.fail(msg, NO_PERMISSION).await;
        }

        handlers::run(self, spec.kind, &invocation.args, msg).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
