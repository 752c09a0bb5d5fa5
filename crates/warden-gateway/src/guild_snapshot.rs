//! Guild snapshot document: members, channels, and the agent identity used to
//! seed the in-memory gateway for contract runs and tests.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::gateway_contract::GuildMember;

pub const GUILD_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

fn guild_snapshot_schema_version() -> u32 {
    GUILD_SNAPSHOT_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Seed state for one simulated guild.
pub struct GuildSnapshotFile {
    #[serde(default = "guild_snapshot_schema_version")]
    pub schema_version: u32,
    pub agent_user_id: String,
    #[serde(default)]
    pub members: Vec<GuildMember>,
    #[serde(default)]
    pub channel_ids: Vec<String>,
}

pub fn parse_guild_snapshot(raw: &str) -> Result<GuildSnapshotFile> {
    let snapshot: GuildSnapshotFile =
        serde_json::from_str(raw).context("failed to parse guild snapshot")?;
    validate_guild_snapshot(&snapshot)?;
    Ok(snapshot)
}

pub fn load_guild_snapshot(path: &Path) -> Result<GuildSnapshotFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read guild snapshot {}", path.display()))?;
    parse_guild_snapshot(&raw).with_context(|| format!("invalid guild snapshot {}", path.display()))
}

pub fn validate_guild_snapshot(snapshot: &GuildSnapshotFile) -> Result<()> {
    if snapshot.schema_version != GUILD_SNAPSHOT_SCHEMA_VERSION {
        bail!(
            "unsupported guild snapshot schema version {} (expected {})",
            snapshot.schema_version,
            GUILD_SNAPSHOT_SCHEMA_VERSION
        );
    }
    if snapshot.agent_user_id.trim().is_empty() {
        bail!("guild snapshot agent_user_id must not be empty");
    }

    let mut member_ids = BTreeSet::new();
    for member in &snapshot.members {
        if member.user_id.trim().is_empty() {
            bail!("guild snapshot contains a member with an empty user_id");
        }
        if !member_ids.insert(member.user_id.as_str()) {
            bail!(
                "guild snapshot contains duplicate member '{}'",
                member.user_id
            );
        }
        if member.role_ids.iter().any(|role| role.trim().is_empty()) {
            bail!(
                "guild snapshot member '{}' has an empty role id",
                member.user_id
            );
        }
    }
    if !member_ids.contains(snapshot.agent_user_id.as_str()) {
        bail!(
            "guild snapshot agent '{}' is not listed among members",
            snapshot.agent_user_id
        );
    }

    let mut channel_ids = BTreeSet::new();
    for channel_id in &snapshot.channel_ids {
        if channel_id.trim().is_empty() {
            bail!("guild snapshot contains an empty channel id");
        }
        if !channel_ids.insert(channel_id.as_str()) {
            bail!("guild snapshot contains duplicate channel '{channel_id}'");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(user_id: &str, rank: i64) -> GuildMember {
        GuildMember {
            user_id: user_id.to_string(),
            display_name: String::new(),
            role_ids: Vec::new(),
            top_role_rank: rank,
            is_bot: false,
        }
    }

    fn snapshot() -> GuildSnapshotFile {
        GuildSnapshotFile {
            schema_version: GUILD_SNAPSHOT_SCHEMA_VERSION,
            agent_user_id: "agent-1".to_string(),
            members: vec![member("agent-1", 50), member("user-1", 5)],
            channel_ids: vec!["chan-1".to_string()],
        }
    }

    #[test]
    fn unit_validate_accepts_baseline_snapshot() {
        validate_guild_snapshot(&snapshot()).expect("valid");
    }

    #[test]
    fn unit_validate_requires_agent_membership() {
        let mut bad = snapshot();
        bad.agent_user_id = "agent-missing".to_string();
        let error = validate_guild_snapshot(&bad).expect_err("must reject");
        assert!(error.to_string().contains("is not listed among members"));
    }

    #[test]
    fn unit_validate_rejects_duplicate_members() {
        let mut bad = snapshot();
        bad.members.push(member("user-1", 3));
        let error = validate_guild_snapshot(&bad).expect_err("must reject");
        assert!(error.to_string().contains("duplicate member 'user-1'"));
    }

    #[test]
    fn functional_snapshot_loads_from_disk() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("guild.json");
        std::fs::write(
            &path,
            serde_json::to_string_pretty(&snapshot()).expect("json"),
        )
        .expect("write");
        let loaded = load_guild_snapshot(&path).expect("load");
        assert_eq!(loaded, snapshot());
    }
}
