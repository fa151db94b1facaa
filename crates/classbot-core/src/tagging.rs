//! Keeps a configured role on exactly the members with a configured name.

use crate::config::TaggingConfig;
use crate::error::Result;
use crate::platform::{Member, Platform, Role};

const CREATE_REASON: &str = "tagging role did not exist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    Add,
    Remove,
    None,
}

pub fn role_action(member: &Member, display_name: &str, role: Option<&Role>) -> RoleAction {
    let allowed = member.display_name == display_name;
    let has = role.is_some_and(|r| member.has_role(&r.id));
    match (allowed, has) {
        (true, false) => RoleAction::Add,
        (false, true) => RoleAction::Remove,
        _ => RoleAction::None,
    }
}

/// Case-insensitive role lookup.
pub fn find_role<'a>(roles: &'a [Role], name: &str) -> Option<&'a Role> {
    let name = name.to_lowercase();
    roles.iter().find(|r| r.name.to_lowercase() == name)
}

pub async fn get_or_create_role(platform: &dyn Platform, name: &str) -> Result<Role> {
    let roles = platform.roles().await?;
    if let Some(role) = find_role(&roles, name) {
        return Ok(role.clone());
    }
    tracing::info!(role = name, "creating tagging role");
    platform.create_role(name, None, CREATE_REASON).await
}

async fn apply(
    platform: &dyn Platform,
    member: &Member,
    role: &Role,
    action: RoleAction,
    reason: &str,
) -> Result<()> {
    match action {
        RoleAction::Add => platform.add_member_role(&member.user_id, &role.id, reason).await,
        RoleAction::Remove => {
            platform
                .remove_member_role(&member.user_id, &role.id, reason)
                .await
        }
        RoleAction::None => Ok(()),
    }
}

/// Evaluate every member once. Returns how many were changed.
pub async fn sweep(platform: &dyn Platform, cfg: &TaggingConfig) -> Result<usize> {
    let (roles, members) = tokio::try_join!(platform.roles(), platform.members())?;
    let mut role = find_role(&roles, cfg.role_name()).cloned();
    let mut changed = 0;

    for member in &members {
        let action = role_action(member, &cfg.display_name, role.as_ref());
        if action == RoleAction::None {
            continue;
        }
        let target = match &role {
            Some(r) => r.clone(),
            None => {
                let created = get_or_create_role(platform, cfg.role_name()).await?;
                role = Some(created.clone());
                created
            }
        };
        apply(platform, member, &target, action, &cfg.display_name).await?;
        changed += 1;
        tokio::time::sleep(cfg.pause()).await;
    }

    tracing::info!(changed, "tagging sweep finished");
    Ok(changed)
}

/// React to a member update. Only visible-name changes are considered.
pub async fn handle_member_update(
    platform: &dyn Platform,
    cfg: &TaggingConfig,
    before: &Member,
    after: &Member,
) -> Result<RoleAction> {
    if before.display_name == after.display_name {
        return Ok(RoleAction::None);
    }
    let roles = platform.roles().await?;
    let action = role_action(after, &cfg.display_name, find_role(&roles, cfg.role_name()));
    if action == RoleAction::None {
        return Ok(action);
    }
    let role = get_or_create_role(platform, cfg.role_name()).await?;
    apply(platform, after, &role, action, &cfg.display_name).await?;
    Ok(action)
}
