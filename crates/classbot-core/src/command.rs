use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Permission / CommandKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Anyone,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    AddClass,
    Classes,
    IngestClasses,
    UpdateClasses,
    AddRole,
    RemoveRole,
    Roles,
    Refresh,
}

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub permission: Permission,
    pub kind: CommandKind,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "add-class",
        description: "add a new class channel",
        permission: Permission::Admin,
        kind: CommandKind::AddClass,
    },
    CommandSpec {
        name: "classes",
        description: "list all classes the bot knows about",
        permission: Permission::Anyone,
        kind: CommandKind::Classes,
    },
    CommandSpec {
        name: "ingest-classes",
        description: "find class channels that have not been registered",
        permission: Permission::Admin,
        kind: CommandKind::IngestClasses,
    },
    CommandSpec {
        name: "update-classes",
        description: "create any missing class channels and roles",
        permission: Permission::Admin,
        kind: CommandKind::UpdateClasses,
    },
    CommandSpec {
        name: "add-role",
        description: "add a class role to yourself",
        permission: Permission::Anyone,
        kind: CommandKind::AddRole,
    },
    CommandSpec {
        name: "remove-role",
        description: "remove a class role from yourself",
        permission: Permission::Anyone,
        kind: CommandKind::RemoveRole,
    },
    CommandSpec {
        name: "roles",
        description: "list all available class roles",
        permission: Permission::Anyone,
        kind: CommandKind::Roles,
    },
    CommandSpec {
        name: "refresh",
        description: "reload and list the available commands",
        permission: Permission::Admin,
        kind: CommandKind::Refresh,
    },
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name == name)
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Lowercased command name.
    pub name: String,
    pub args: Vec<String>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Split `<prefix><name> <args...>`. Returns `None` when `content` does not
/// start with `prefix` or names no command.
pub fn parse(prefix: &str, content: &str) -> Option<Invocation> {
    let rest = content.strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let name = words.next()?.to_lowercase();
    Some(Invocation {
        name,
        args: words.map(str::to_string).collect(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
