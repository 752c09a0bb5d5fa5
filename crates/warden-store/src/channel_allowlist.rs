//! Allowed-channel document for the event open/close toggle.
//!
//! Read-only at runtime; the document is populated by hand.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::document_io::load_json_document;

pub const CHANNEL_ALLOWLIST_SCHEMA_VERSION: u32 = 1;

const CHANNEL_ALLOWLIST_LABEL: &str = "channel allowlist";

fn channel_allowlist_schema_version() -> u32 {
    CHANNEL_ALLOWLIST_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChannelAllowlistState {
    #[serde(default = "channel_allowlist_schema_version")]
    schema_version: u32,
    #[serde(default)]
    allowed_channel_ids: Vec<String>,
}

impl Default for ChannelAllowlistState {
    fn default() -> Self {
        Self {
            schema_version: CHANNEL_ALLOWLIST_SCHEMA_VERSION,
            allowed_channel_ids: Vec::new(),
        }
    }
}

pub fn channel_allowlist_path(state_dir: &Path) -> PathBuf {
    state_dir.join("channels.json")
}

/// Channels on which the event open/close toggle may act.
#[derive(Debug)]
pub struct ChannelAllowlist {
    state: ChannelAllowlistState,
}

impl ChannelAllowlist {
    pub fn load(path: PathBuf) -> Result<Self> {
        let state: ChannelAllowlistState = load_json_document(&path, CHANNEL_ALLOWLIST_LABEL)?;
        if state.schema_version != CHANNEL_ALLOWLIST_SCHEMA_VERSION {
            bail!(
                "unsupported channel allowlist schema version {} (expected {})",
                state.schema_version,
                CHANNEL_ALLOWLIST_SCHEMA_VERSION
            );
        }
        let mut seen = BTreeSet::new();
        for channel_id in &state.allowed_channel_ids {
            if channel_id.trim().is_empty() {
                bail!("channel allowlist contains an empty channel id");
            }
            if !seen.insert(channel_id.as_str()) {
                bail!("channel allowlist contains duplicate channel id '{channel_id}'");
            }
        }
        Ok(Self { state })
    }

    pub fn contains(&self, channel_id: &str) -> bool {
        self.state
            .allowed_channel_ids
            .iter()
            .any(|allowed| allowed == channel_id)
    }

    pub fn allowed_channel_ids(&self) -> &[String] {
        &self.state.allowed_channel_ids
    }
}
