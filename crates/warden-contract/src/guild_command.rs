//! Tagged moderation commands and resolution from inbound events.
//!
//! Command payloads resolve exactly once, at the dispatch boundary, into a
//! variant with a fixed field set; handlers never read option bags by string
//! key. Plain-text `/reactions` forms are also parsed here for the legacy
//! prefix surface.

use crate::guild_contract::GuildCommandInvocation;

pub const COMMAND_REACTIONS: &str = "reactions";
pub const COMMAND_REACTIONS_SET: &str = "reactions-set";
pub const COMMAND_MUTE: &str = "mute";
pub const COMMAND_UNMUTE: &str = "unmute";
pub const COMMAND_EVENT_OPEN: &str = "event-open";
pub const COMMAND_EVENT_CLOSE: &str = "event-close";
pub const COMMAND_RESTRICT: &str = "restrict";
pub const COMMAND_GRANT_ROLE: &str = "grant-role";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `GuildCommand` values.
pub enum GuildCommand {
    ReactionList,
    ReactionSet { trigger: String, symbol: String },
    Mute { target_user_id: String },
    Unmute { target_user_id: String },
    EventOpen,
    EventClose,
    Restrict { target_user_id: String },
    GrantRole { target_user_id: String },
    Invalid { message: String },
}

impl GuildCommand {
    /// Stable command label used in logs and the event journal.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReactionList => COMMAND_REACTIONS,
            Self::ReactionSet { .. } => COMMAND_REACTIONS_SET,
            Self::Mute { .. } => COMMAND_MUTE,
            Self::Unmute { .. } => COMMAND_UNMUTE,
            Self::EventOpen => COMMAND_EVENT_OPEN,
            Self::EventClose => COMMAND_EVENT_CLOSE,
            Self::Restrict { .. } => COMMAND_RESTRICT,
            Self::GrantRole { .. } => COMMAND_GRANT_ROLE,
            Self::Invalid { .. } => "invalid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Registration metadata for one command surface.
pub struct GuildCommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub args: &'static [&'static str],
}

/// Catalog consumed by platform-side registration tooling and `validate`.
pub const GUILD_COMMAND_CATALOG: &[GuildCommandSpec] = &[
    GuildCommandSpec {
        name: COMMAND_REACTIONS,
        description: "List configured reaction rules.",
        args: &[],
    },
    GuildCommandSpec {
        name: COMMAND_REACTIONS_SET,
        description: "Create or overwrite a reaction rule.",
        args: &["trigger", "symbol"],
    },
    GuildCommandSpec {
        name: COMMAND_MUTE,
        description: "Mute a member, snapshotting their roles.",
        args: &["user"],
    },
    GuildCommandSpec {
        name: COMMAND_UNMUTE,
        description: "Unmute a member and restore snapshotted roles.",
        args: &["user"],
    },
    GuildCommandSpec {
        name: COMMAND_EVENT_OPEN,
        description: "Open the current event channel to everyone.",
        args: &[],
    },
    GuildCommandSpec {
        name: COMMAND_EVENT_CLOSE,
        description: "Close the current event channel to everyone.",
        args: &[],
    },
    GuildCommandSpec {
        name: COMMAND_RESTRICT,
        description: "Hide the restricted channel list from a member.",
        args: &["user"],
    },
    GuildCommandSpec {
        name: COMMAND_GRANT_ROLE,
        description: "Grant the temporary role for the configured duration.",
        args: &["user"],
    },
];

fn command_usage(name: &str, args: &[&str]) -> String {
    if args.is_empty() {
        format!("Usage: /{name}")
    } else {
        let rendered = args
            .iter()
            .map(|arg| format!("{arg}:<{arg}>"))
            .collect::<Vec<String>>()
            .join(" ");
        format!("Usage: /{name} {rendered}")
    }
}

fn required_arg(invocation: &GuildCommandInvocation, key: &str) -> Option<String> {
    invocation
        .args
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolves a structured command payload into a tagged `GuildCommand`.
///
/// Unknown names and missing arguments resolve to `Invalid` with a usage
/// message so the dispatcher can reply without special cases.
pub fn resolve_command_invocation(invocation: &GuildCommandInvocation) -> GuildCommand {
    let name = invocation.name.trim();
    match name {
        COMMAND_REACTIONS => GuildCommand::ReactionList,
        COMMAND_REACTIONS_SET => {
            match (
                required_arg(invocation, "trigger"),
                required_arg(invocation, "symbol"),
            ) {
                (Some(trigger), Some(symbol)) => GuildCommand::ReactionSet { trigger, symbol },
                _ => GuildCommand::Invalid {
                    message: command_usage(COMMAND_REACTIONS_SET, &["trigger", "symbol"]),
                },
            }
        }
        COMMAND_MUTE => match required_arg(invocation, "user") {
            Some(target_user_id) => GuildCommand::Mute { target_user_id },
            None => GuildCommand::Invalid {
                message: command_usage(COMMAND_MUTE, &["user"]),
            },
        },
        COMMAND_UNMUTE => match required_arg(invocation, "user") {
            Some(target_user_id) => GuildCommand::Unmute { target_user_id },
            None => GuildCommand::Invalid {
                message: command_usage(COMMAND_UNMUTE, &["user"]),
            },
        },
        COMMAND_EVENT_OPEN => GuildCommand::EventOpen,
        COMMAND_EVENT_CLOSE => GuildCommand::EventClose,
        COMMAND_RESTRICT => match required_arg(invocation, "user") {
            Some(target_user_id) => GuildCommand::Restrict { target_user_id },
            None => GuildCommand::Invalid {
                message: command_usage(COMMAND_RESTRICT, &["user"]),
            },
        },
        COMMAND_GRANT_ROLE => match required_arg(invocation, "user") {
            Some(target_user_id) => GuildCommand::GrantRole { target_user_id },
            None => GuildCommand::Invalid {
                message: command_usage(COMMAND_GRANT_ROLE, &["user"]),
            },
        },
        _ => GuildCommand::Invalid {
            message: format!("Unknown command `{name}`."),
        },
    }
}

/// Parses the legacy `/reactions` prefix forms from plain message text.
///
/// Returns `None` when the text is not a prefix command at all. The set form
/// takes exactly two tokens after the prefix; the symbol does not span spaces.
pub fn parse_prefix_command(text: &str) -> Option<GuildCommand> {
    let trimmed = text.trim();
    let mut pieces = trimmed.split_whitespace();
    let prefix = pieces.next()?;
    match prefix {
        "/reactions" => {
            if pieces.next().is_some() {
                Some(GuildCommand::Invalid {
                    message: command_usage(COMMAND_REACTIONS, &[]),
                })
            } else {
                Some(GuildCommand::ReactionList)
            }
        }
        "/reactions-set" => match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(trigger), Some(symbol), None) => Some(GuildCommand::ReactionSet {
                trigger: trigger.to_string(),
                symbol: symbol.to_string(),
            }),
            _ => Some(GuildCommand::Invalid {
                message: "Usage: /reactions-set <trigger> <symbol>".to_string(),
            }),
        },
        _ => None,
    }
}
