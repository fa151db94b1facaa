//! One function per [`CommandKind`].

use crate::bot::Bot;
use crate::command::{CommandKind, COMMANDS};
use crate::conversation::{self, block_code, inline_code};
use crate::error::{ClassbotError, Result};
use crate::ingest;
use crate::naming::DISPLAY_LANGUAGE;
use crate::platform::{Embed, IncomingMessage, Role};
use crate::tagging::find_role;
use crate::types::ManagedClass;

const ROLE_SEPARATOR: &str = " \u{200b} \u{200b} \u{200b} ";

pub async fn run(
    bot: &Bot,
    kind: CommandKind,
    args: &[String],
    msg: &IncomingMessage,
) -> Result<()> {
    match kind {
        CommandKind::AddClass => add_class(bot, args, msg).await,
        CommandKind::Classes => classes(bot, msg).await,
        CommandKind::IngestClasses => ingest::run(bot, msg).await.map(|_| ()),
        CommandKind::UpdateClasses => update_classes(bot, msg).await,
        CommandKind::AddRole => toggle_role(bot, args, msg, true).await,
        CommandKind::RemoveRole => toggle_role(bot, args, msg, false).await,
        CommandKind::Roles => roles(bot, msg).await,
        CommandKind::Refresh => refresh(bot, msg).await,
    }
}

/// Mark success, ignoring a failed reaction; the work itself already happened.
async fn mark_done(bot: &Bot, msg: &IncomingMessage) {
    if let Err(e) = conversation::success(bot.platform(), msg).await {
        tracing::warn!(error = %e, "could not react to command");
    }
}

/// Mark success, then delete the command message after the reply TTL.
async fn mark_done_and_tidy(bot: &Bot, msg: &IncomingMessage) {
    mark_done(bot, msg).await;
    tokio::time::sleep(bot.config().reply_ttl()).await;
    if let Err(e) = bot.platform().delete_message(&msg.message_ref()).await {
        tracing::warn!(error = %e, "could not delete command message");
    }
}

fn sorted_role_names(classes: &[ManagedClass]) -> Vec<String> {
    let mut names: Vec<String> = classes.iter().map(ManagedClass::role_name).collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// add-class / update-classes
// ---------------------------------------------------------------------------

async fn add_class(bot: &Bot, args: &[String], msg: &IncomingMessage) -> Result<()> {
    let [department, course_id, ..] = args else {
        return bot
            .fail(msg, "Expected input in the form of \"DEPARTMENT COURSE_ID\"")
            .await;
    };

    let class = match ManagedClass::new(department.as_str(), course_id.as_str()) {
        Ok(class) => class,
        Err(ClassbotError::InvalidDepartment(_)) => {
            return bot.fail(msg, "Bad department, only letters are allowed").await
        }
        Err(ClassbotError::InvalidCourseId(_)) => {
            return bot.fail(msg, "Bad course id, only numbers are allowed").await
        }
        Err(e) => return Err(e),
    };

    tracing::info!(class = %class, by = %msg.author_id, "adding managed class");
    bot.add_classes(vec![class]).await?;
    bot.reconcile().await?;
    mark_done(bot, msg).await;
    Ok(())
}

async fn update_classes(bot: &Bot, msg: &IncomingMessage) -> Result<()> {
    bot.reconcile().await?;
    mark_done(bot, msg).await;
    Ok(())
}

// ---------------------------------------------------------------------------
// classes / roles
// ---------------------------------------------------------------------------

async fn classes(bot: &Bot, msg: &IncomingMessage) -> Result<()> {
    let classes = bot.classes().await;
    if classes.is_empty() {
        bot.platform()
            .reply(msg, "I don't know about any classes!")
            .await?;
        return Ok(());
    }

    let listing = sorted_role_names(&classes).join(", ");
    let text = format!(
        "I know about {} class(es): \n{}",
        inline_code(classes.len()),
        block_code(&listing, Some(DISPLAY_LANGUAGE))
    );
    conversation::success_with(bot.platform(), msg, &text).await
}

async fn roles(bot: &Bot, msg: &IncomingMessage) -> Result<()> {
    let classes = bot.classes().await;
    let names = sorted_role_names(&classes);
    let value = if names.is_empty() {
        "none".to_string()
    } else {
        names.join(ROLE_SEPARATOR)
    };
    let embed = Embed {
        color: 0x000000,
        field_name: "Available Roles".to_string(),
        field_value: value,
    };
    bot.platform().send_embed(&msg.channel_id, &embed).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// add-role / remove-role
// ---------------------------------------------------------------------------

/// Only roles belonging to a managed class are self-assignable.
fn class_role<'a>(
    roles: &'a [Role],
    classes: &[ManagedClass],
    requested: &str,
) -> Option<&'a Role> {
    let role = find_role(roles, requested)?;
    classes
        .iter()
        .any(|c| c.role_name() == role.name)
        .then_some(role)
}

async fn toggle_role(bot: &Bot, args: &[String], msg: &IncomingMessage, add: bool) -> Result<()> {
    let requested = args.join(" ");
    let (roles, classes) = (bot.platform().roles().await?, bot.classes().await);

    let Some(role) = class_role(&roles, &classes, &requested) else {
        return bot.fail(msg, "That role doesn't exist!").await;
    };

    let result = if add {
        bot.platform()
            .add_member_role(&msg.author_id, &role.id, "self-assigned class role")
            .await
    } else {
        bot.platform()
            .remove_member_role(&msg.author_id, &role.id, "self-removed class role")
            .await
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, role = %role.name, "role change rejected");
        let reason = if add {
            "I can't add that role to you!"
        } else {
            "I can't remove that role from you!"
        };
        return bot.fail(msg, reason).await;
    }

    mark_done_and_tidy(bot, msg).await;
    Ok(())
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

async fn refresh(bot: &Bot, msg: &IncomingMessage) -> Result<()> {
    let names: Vec<String> = COMMANDS.iter().map(|c| inline_code(c.name)).collect();
    tracing::info!(count = COMMANDS.len(), "command table refreshed");
    bot.platform()
        .reply(
            msg,
            &format!("Loaded {} command(s): {}", COMMANDS.len(), names.join(", ")),
        )
        .await?;
    mark_done_and_tidy(bot, msg).await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse;
    use crate::conversation::{FAILURE_EMOJI, SUCCESS_EMOJI};
    use crate::testing::{message, test_bot, FakePlatform};
    use tempfile::TempDir;

    async fn exec(bot: &Bot, id: &str, author: &str, content: &str) {
        let msg = message(id, author, content);
        let inv = parse("!", content).unwrap();
        bot.execute(&inv, &msg).await.unwrap();
    }

    #[tokio::test]
    async fn add_class_records_and_reconciles() {
        let dir = TempDir::new().unwrap();
        let (bot, platform) = test_bot(
            &dir,
            FakePlatform::new()
                .with_admin("admin")
                .with_category("course-specific"),
        );

        exec(&bot, "m1", "admin", "!add-class CS 101").await;

        assert_eq!(bot.classes().await, vec![ManagedClass::from_parts("CS", "101")]);
        assert!(platform.channel_names().contains(&"cs-101".to_string()));
        assert_eq!(platform.role_names(), vec!["CS 101"]);
        assert_eq!(platform.reactions_on("m1"), vec![SUCCESS_EMOJI]);
        let raw = std::fs::read_to_string(dir.path().join("data.json")).unwrap();
        assert!(raw.contains(r#"["CS","101"]"#));
    }

    #[tokio::test]
    async fn add_class_validates_arguments() {
        let dir = TempDir::new().unwrap();
        let (bot, platform) = test_bot(&dir, FakePlatform::new().with_admin("admin"));

        exec(&bot, "m1", "admin", "!add-class CS").await;
        exec(&bot, "m2", "admin", "!add-class C5 101").await;
        exec(&bot, "m3", "admin", "!add-class CS 1o1").await;

        assert!(bot.classes().await.is_empty());
        assert_eq!(
            platform.reply_texts(),
            vec![
                "Expected input in the form of \"DEPARTMENT COURSE_ID\"",
                "Bad department, only letters are allowed",
                "Bad course id, only numbers are allowed",
            ]
        );
        for id in ["m1", "m2", "m3"] {
            assert_eq!(platform.reactions_on(id), vec![FAILURE_EMOJI]);
        }
    }

    #[tokio::test]
    async fn classes_lists_sorted_role_names() {
        let dir = TempDir::new().unwrap();
        let (bot, platform) = test_bot(&dir, FakePlatform::new());
        bot.add_classes(vec![
            ManagedClass::from_parts("math", "1"),
            ManagedClass::from_parts("CS", "9"),
            ManagedClass::from_parts("cs", "101"),
        ])
        .await
        .unwrap();

        exec(&bot, "m1", "user", "!classes").await;

        assert_eq!(
            platform.reply_texts(),
            vec!["I know about `3` class(es): \n```haskell\nCS 101, CS 9, MATH 1\n```"]
        );
        assert_eq!(platform.reactions_on("m1"), vec![SUCCESS_EMOJI]);
    }

    #[tokio::test]
    async fn roles_sends_embed() {
        let dir = TempDir::new().unwrap();
        let (bot, platform) = test_bot(&dir, FakePlatform::new());
        bot.add_classes(vec![
            ManagedClass::from_parts("math", "1"),
            ManagedClass::from_parts("cs", "101"),
        ])
        .await
        .unwrap();

        exec(&bot, "m1", "user", "!roles").await;

        let state = platform.state();
        assert_eq!(state.embeds.len(), 1);
        let (channel, embed) = &state.embeds[0];
        assert_eq!(channel, "general");
        assert_eq!(embed.field_name, "Available Roles");
        assert_eq!(embed.field_value, format!("CS 101{ROLE_SEPARATOR}MATH 1"));
    }

    #[tokio::test]
    async fn add_role_assigns_class_role_and_tidies() {
        let dir = TempDir::new().unwrap();
        let (bot, platform) = test_bot(
            &dir,
            FakePlatform::new()
                .with_role("CS 101")
                .with_member("user", "Student", &[]),
        );
        bot.add_classes(vec![ManagedClass::from_parts("CS", "101")])
            .await
            .unwrap();

        exec(&bot, "m1", "user", "!add-role cs 101").await;

        let state = platform.state();
        assert_eq!(state.members[0].role_ids, vec!["role-CS 101"]);
        assert!(state.deleted.contains(&"m1".to_string()));
    }

    #[tokio::test]
    async fn remove_role_unassigns() {
        let dir = TempDir::new().unwrap();
        let (bot, platform) = test_bot(
            &dir,
            FakePlatform::new()
                .with_role("CS 101")
                .with_member("user", "Student", &["role-CS 101"]),
        );
        bot.add_classes(vec![ManagedClass::from_parts("CS", "101")])
            .await
            .unwrap();

        exec(&bot, "m1", "user", "!remove-role CS 101").await;

        assert!(platform.state().members[0].role_ids.is_empty());
        assert_eq!(platform.reactions_on("m1"), vec![SUCCESS_EMOJI]);
    }

    #[tokio::test]
    async fn non_class_roles_are_not_self_assignable() {
        let dir = TempDir::new().unwrap();
        let (bot, platform) = test_bot(
            &dir,
            FakePlatform::new()
                .with_role("Moderators")
                .with_member("user", "Student", &[]),
        );

        exec(&bot, "m1", "user", "!add-role moderators").await;

        assert!(platform.state().members[0].role_ids.is_empty());
        assert_eq!(platform.reply_texts(), vec!["That role doesn't exist!"]);
    }

    #[tokio::test]
    async fn rejected_role_change_reports_failure() {
        let dir = TempDir::new().unwrap();
        // No such member on the platform, so the add call is rejected.
        let (bot, platform) = test_bot(&dir, FakePlatform::new().with_role("CS 101"));
        bot.add_classes(vec![ManagedClass::from_parts("CS", "101")])
            .await
            .unwrap();

        exec(&bot, "m1", "user", "!add-role CS 101").await;

        assert_eq!(platform.reply_texts(), vec!["I can't add that role to you!"]);
        assert_eq!(platform.reactions_on("m1"), vec![FAILURE_EMOJI]);
    }

    #[tokio::test]
    async fn refresh_lists_commands() {
        let dir = TempDir::new().unwrap();
        let (bot, platform) = test_bot(&dir, FakePlatform::new().with_admin("admin"));

        exec(&bot, "m1", "admin", "!refresh").await;

        let replies = platform.reply_texts();
        assert!(replies[0].starts_with(&format!("Loaded {} command(s)", COMMANDS.len())));
        assert!(replies[0].contains("`ingest-classes`"));
        assert!(platform.state().deleted.contains(&"m1".to_string()));
    }
}
