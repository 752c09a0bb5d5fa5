//! Guild inbound-event contract schema and fixture parsing.
//!
//! Defines the event envelope delivered by the platform boundary and the
//! validation helpers the dispatcher and runner rely on, so routing code only
//! consumes well-formed events.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const GUILD_CONTRACT_SCHEMA_VERSION: u32 = 1;

fn guild_contract_schema_version() -> u32 {
    GUILD_CONTRACT_SCHEMA_VERSION
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `GuildEventKind` values.
pub enum GuildEventKind {
    Message,
    Command,
}

impl GuildEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Command => "command",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Structured command payload carried by `GuildEventKind::Command` events.
pub struct GuildCommandInvocation {
    pub name: String,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Inbound guild event as delivered by the platform boundary.
pub struct GuildInboundEvent {
    #[serde(default = "guild_contract_schema_version")]
    pub schema_version: u32,
    pub event_kind: GuildEventKind,
    pub event_id: String,
    pub channel_id: String,
    pub actor_id: String,
    #[serde(default)]
    pub actor_display: String,
    #[serde(default)]
    pub actor_role_ids: Vec<String>,
    #[serde(default)]
    pub actor_is_bot: bool,
    pub timestamp_ms: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub command: Option<GuildCommandInvocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Replayable batch of inbound events consumed by the contract runner.
pub struct GuildContractFixture {
    pub schema_version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub events: Vec<GuildInboundEvent>,
}

pub fn parse_guild_contract_fixture(raw: &str) -> Result<GuildContractFixture> {
    let fixture: GuildContractFixture =
        serde_json::from_str(raw).context("failed to parse guild contract fixture")?;
    validate_guild_contract_fixture(&fixture)?;
    Ok(fixture)
}

pub fn load_guild_contract_fixture(path: &Path) -> Result<GuildContractFixture> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read guild contract fixture {}", path.display()))?;
    parse_guild_contract_fixture(&raw)
}

pub fn validate_guild_contract_fixture(fixture: &GuildContractFixture) -> Result<()> {
    if fixture.schema_version != GUILD_CONTRACT_SCHEMA_VERSION {
        bail!(
            "unsupported guild contract schema version {} (expected {})",
            fixture.schema_version,
            GUILD_CONTRACT_SCHEMA_VERSION
        );
    }
    if fixture.name.trim().is_empty() {
        bail!("fixture name cannot be empty");
    }
    if fixture.events.is_empty() {
        bail!("fixture must include at least one event");
    }

    let mut event_keys = HashSet::new();
    for (index, event) in fixture.events.iter().enumerate() {
        validate_guild_event_with_label(event, &format!("fixture event index {}", index))?;
        let key = event_dedupe_key(event);
        if !event_keys.insert(key.clone()) {
            bail!("fixture contains duplicate event key '{key}'");
        }
    }

    Ok(())
}

pub fn validate_guild_inbound_event(event: &GuildInboundEvent) -> Result<()> {
    validate_guild_event_with_label(event, "inbound event")
}

fn validate_guild_event_with_label(event: &GuildInboundEvent, label: &str) -> Result<()> {
    if event.schema_version != GUILD_CONTRACT_SCHEMA_VERSION {
        bail!(
            "{label} has unsupported schema_version {} (expected {})",
            event.schema_version,
            GUILD_CONTRACT_SCHEMA_VERSION
        );
    }
    if event.event_id.trim().is_empty() {
        bail!("{label} has empty event_id");
    }
    if event.channel_id.trim().is_empty() {
        bail!("{label} has empty channel_id");
    }
    if event.actor_id.trim().is_empty() {
        bail!("{label} has empty actor_id");
    }
    if event.timestamp_ms == 0 {
        bail!("{label} has zero timestamp_ms");
    }
    if event
        .actor_role_ids
        .iter()
        .any(|role_id| role_id.trim().is_empty())
    {
        bail!("{label} includes empty actor role id");
    }
    match event.event_kind {
        GuildEventKind::Message => {
            if event.command.is_some() {
                bail!("{label} is a message event but carries a command payload");
            }
            if event.text.trim().is_empty() {
                bail!("{label} is a message event with empty text");
            }
        }
        GuildEventKind::Command => {
            let Some(invocation) = event.command.as_ref() else {
                bail!("{label} is a command event without a command payload");
            };
            if invocation.name.trim().is_empty() {
                bail!("{label} has empty command name");
            }
            if invocation.args.keys().any(|key| key.trim().is_empty()) {
                bail!("{label} includes empty command argument key");
            }
        }
    }

    Ok(())
}

/// Dedupe key used by processed-event tracking across runner passes.
pub fn event_dedupe_key(event: &GuildInboundEvent) -> String {
    format!("{}:{}", event.event_kind.as_str(), event.event_id.trim())
}
