//! Moderation policy document: the role and channel configuration every
//! privileged command is checked against.
//!
//! The policy file is required; moderation without a staff/mute role
//! configuration is meaningless, so a missing file is a startup error rather
//! than a permissive default.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const MODERATION_POLICY_SCHEMA_VERSION: u32 = 1;

/// Default temporary-grant lifetime: seven days.
pub const DEFAULT_GRANT_DURATION_MS: u64 = 604_800_000;

fn moderation_policy_schema_version() -> u32 {
    MODERATION_POLICY_SCHEMA_VERSION
}

fn default_grant_duration_ms() -> u64 {
    DEFAULT_GRANT_DURATION_MS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Guild moderation policy loaded at startup and shared across handlers.
pub struct ModerationPolicyFile {
    #[serde(default = "moderation_policy_schema_version")]
    pub schema_version: u32,
    /// Role required for mute/unmute/restrict and reaction-rule changes.
    pub staff_role_id: String,
    /// Role whose presence marks a member as muted.
    pub mute_role_id: String,
    /// The implicit member role; never snapshotted or restored.
    pub everyone_role_id: String,
    /// Roles allowed to run event open/close and grant-role.
    #[serde(default)]
    pub toggle_role_ids: Vec<String>,
    /// Role handed out by grant-role.
    pub grant_role_id: String,
    #[serde(default = "default_grant_duration_ms")]
    pub grant_duration_ms: u64,
    /// Channels hidden from a member by the restrict command.
    #[serde(default)]
    pub restricted_channel_ids: Vec<String>,
    /// Channels where prefix commands and reaction evaluation apply.
    #[serde(default)]
    pub command_channel_ids: Vec<String>,
}

impl ModerationPolicyFile {
    pub fn is_staff(&self, role_ids: &[String]) -> bool {
        role_ids.iter().any(|role_id| role_id == &self.staff_role_id)
    }

    pub fn holds_toggle_role(&self, role_ids: &[String]) -> bool {
        role_ids
            .iter()
            .any(|role_id| self.toggle_role_ids.iter().any(|allowed| allowed == role_id))
    }

    pub fn is_command_channel(&self, channel_id: &str) -> bool {
        self.command_channel_ids
            .iter()
            .any(|allowed| allowed == channel_id)
    }
}

pub fn parse_moderation_policy(raw: &str) -> Result<ModerationPolicyFile> {
    let policy: ModerationPolicyFile =
        serde_json::from_str(raw).context("failed to parse moderation policy")?;
    validate_moderation_policy(&policy)?;
    Ok(policy)
}

pub fn load_moderation_policy(path: &Path) -> Result<ModerationPolicyFile> {
    if !path.exists() {
        bail!("moderation policy file {} does not exist", path.display());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read moderation policy {}", path.display()))?;
    parse_moderation_policy(&raw)
        .with_context(|| format!("invalid moderation policy {}", path.display()))
}

pub fn validate_moderation_policy(policy: &ModerationPolicyFile) -> Result<()> {
    if policy.schema_version != MODERATION_POLICY_SCHEMA_VERSION {
        bail!(
            "unsupported moderation policy schema version {} (expected {})",
            policy.schema_version,
            MODERATION_POLICY_SCHEMA_VERSION
        );
    }
    if policy.staff_role_id.trim().is_empty() {
        bail!("moderation policy staff_role_id must not be empty");
    }
    if policy.mute_role_id.trim().is_empty() {
        bail!("moderation policy mute_role_id must not be empty");
    }
    if policy.everyone_role_id.trim().is_empty() {
        bail!("moderation policy everyone_role_id must not be empty");
    }
    if policy.mute_role_id == policy.everyone_role_id {
        bail!("moderation policy mute_role_id must differ from everyone_role_id");
    }
    if policy.grant_role_id.trim().is_empty() {
        bail!("moderation policy grant_role_id must not be empty");
    }
    if policy.grant_duration_ms == 0 {
        bail!("moderation policy grant_duration_ms must be greater than zero");
    }
    ensure_unique_non_blank("toggle_role_ids", &policy.toggle_role_ids)?;
    ensure_unique_non_blank("restricted_channel_ids", &policy.restricted_channel_ids)?;
    ensure_unique_non_blank("command_channel_ids", &policy.command_channel_ids)?;
    Ok(())
}

fn ensure_unique_non_blank(field: &str, values: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for value in values {
        if value.trim().is_empty() {
            bail!("moderation policy {field} contains an empty entry");
        }
        if !seen.insert(value.as_str()) {
            bail!("moderation policy {field} contains duplicate entry '{value}'");
        }
    }
    Ok(())
}
