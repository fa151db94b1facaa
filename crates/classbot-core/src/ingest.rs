//! The `ingest-classes` confirmation dialogue.
//!
//! ```text
//! Idle ──candidates──▶ AwaitingConfirmation ──"confirm"──▶ Confirmed
//!   │                         ├──other text──▶ Cancelled
//!   └─none─▶ (done)           └──timeout────▶ TimedOut
//! ```

use crate::bot::Bot;
use crate::conversation::{self, block_code, inline_code, Awaited};
use crate::error::Result;
use crate::naming::{self, DISPLAY_LANGUAGE};
use crate::platform::IncomingMessage;
use crate::reconcile;
use crate::types::ManagedClass;

pub const CONFIRM_TOKEN: &str = "confirm";

const NOTHING_TO_DO: &str = "Looks like I know about all managed classes!";
const TIMED_OUT: &str = "Did not receive any input before timeout, no classes were added.";
const CANCELLED: &str = "Operation has been cancelled. Please run the command again to restart.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Cancelled,
    TimedOut,
}

/// Classify the user's answer; `None` means nothing arrived in time.
pub fn decide(reply: Option<&str>) -> Decision {
    match reply {
        None => Decision::TimedOut,
        Some(text) if text.trim().eq_ignore_ascii_case(CONFIRM_TOKEN) => Decision::Confirmed,
        Some(_) => Decision::Cancelled,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    NothingToDo,
    Confirmed { added: usize },
    Cancelled,
    TimedOut,
}

fn prompt_text(candidates: &[ManagedClass]) -> String {
    let mut names: Vec<String> = candidates.iter().map(naming::display).collect();
    names.sort();
    format!(
        "Looks like there might be {} managed class(es) that I don't know about:\n{}\n\
         Please say \"{}\" to create these managed classes.",
        inline_code(candidates.len()),
        block_code(&names.join(", "), Some(DISPLAY_LANGUAGE)),
        CONFIRM_TOKEN
    )
}

pub async fn run(bot: &Bot, msg: &IncomingMessage) -> Result<IngestOutcome> {
    let platform = bot.platform();
    let classes = bot.classes().await;
    let channels = platform.channels().await?;
    let candidates = reconcile::ingestion_candidates(&classes, &channels);

    if candidates.is_empty() {
        conversation::success_with(platform, msg, NOTHING_TO_DO).await?;
        return Ok(IngestOutcome::NothingToDo);
    }

    let prompt = platform.reply(msg, &prompt_text(&candidates)).await?;
    let outcome = confirm_and_apply(bot, msg, candidates).await;
    if let Err(e) = platform.delete_message(&prompt).await {
        tracing::warn!(error = %e, "could not delete ingestion prompt");
    }
    outcome
}

async fn confirm_and_apply(
    bot: &Bot,
    msg: &IncomingMessage,
    candidates: Vec<ManagedClass>,
) -> Result<IngestOutcome> {
    let platform = bot.platform();
    let decision = match bot.await_reply(msg, bot.config().confirm_timeout()).await {
        Awaited::Reply(reply) => {
            if let Err(e) = platform.delete_message(&reply.message_ref()).await {
                tracing::warn!(error = %e, "could not delete confirmation reply");
            }
            decide(Some(&reply.content))
        }
        // A later ingest-classes from the same user owns the answer now.
        Awaited::Superseded => Decision::Cancelled,
        Awaited::TimedOut => decide(None),
    };

    match decision {
        Decision::TimedOut => {
            bot.fail(msg, TIMED_OUT).await?;
            Ok(IngestOutcome::TimedOut)
        }
        Decision::Cancelled => {
            bot.fail(msg, CANCELLED).await?;
            Ok(IngestOutcome::Cancelled)
        }
        Decision::Confirmed => {
            let added = candidates.len();
            bot.add_classes(candidates).await?;
            bot.reconcile().await?;
            tracing::info!(added, "ingested class channels");
            conversation::success_with(
                platform,
                msg,
                &format!("Successfully added {} new class(es).", inline_code(added)),
            )
            .await?;
            Ok(IngestOutcome::Confirmed { added })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
