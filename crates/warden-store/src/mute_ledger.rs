//! Mute snapshot ledger: the roles each muted user held before the mute.
//!
//! The ledger entry for a user exists exactly while that user is muted. The
//! consuming side removes the entry and persists the removal before any
//! restore call, so a retry can never double-apply a snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::document_io::{load_json_document, save_json_document};

pub const MUTE_LEDGER_SCHEMA_VERSION: u32 = 1;

const MUTE_LEDGER_LABEL: &str = "mute ledger";

fn mute_ledger_schema_version() -> u32 {
    MUTE_LEDGER_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MuteLedgerState {
    #[serde(default = "mute_ledger_schema_version")]
    schema_version: u32,
    #[serde(default)]
    mutes: BTreeMap<String, Vec<String>>,
}

impl Default for MuteLedgerState {
    fn default() -> Self {
        Self {
            schema_version: MUTE_LEDGER_SCHEMA_VERSION,
            mutes: BTreeMap::new(),
        }
    }
}

pub fn mute_ledger_path(state_dir: &Path) -> PathBuf {
    state_dir.join("mutes.json")
}

/// Process-owned cache of the mute document with an explicit flush lifecycle.
#[derive(Debug)]
pub struct MuteLedger {
    path: PathBuf,
    state: MuteLedgerState,
}

impl MuteLedger {
    pub fn load(path: PathBuf) -> Result<Self> {
        let state: MuteLedgerState = load_json_document(&path, MUTE_LEDGER_LABEL)?;
        if state.schema_version != MUTE_LEDGER_SCHEMA_VERSION {
            bail!(
                "unsupported mute ledger schema version {} (expected {})",
                state.schema_version,
                MUTE_LEDGER_SCHEMA_VERSION
            );
        }
        Ok(Self { path, state })
    }

    pub fn is_muted(&self, user_id: &str) -> bool {
        self.state.mutes.contains_key(user_id)
    }

    pub fn snapshot_for(&self, user_id: &str) -> Option<&[String]> {
        self.state.mutes.get(user_id).map(Vec::as_slice)
    }

    pub fn muted_user_count(&self) -> usize {
        self.state.mutes.len()
    }

    /// Records the pre-mute snapshot and persists the full document.
    pub fn record_and_flush(&mut self, user_id: &str, role_ids: Vec<String>) -> Result<()> {
        let previous = self.state.mutes.insert(user_id.to_string(), role_ids);
        if let Err(error) = self.flush() {
            // Cache and document must agree; undo the insert on a failed flush.
            match previous {
                Some(previous) => {
                    self.state.mutes.insert(user_id.to_string(), previous);
                }
                None => {
                    self.state.mutes.remove(user_id);
                }
            }
            return Err(error);
        }
        Ok(())
    }

    /// Removes the snapshot and persists the removal before returning it.
    pub fn take_and_flush(&mut self, user_id: &str) -> Result<Option<Vec<String>>> {
        let Some(snapshot) = self.state.mutes.remove(user_id) else {
            return Ok(None);
        };
        if let Err(error) = self.flush() {
            // Cache and document must agree; put the entry back on a failed flush.
            self.state.mutes.insert(user_id.to_string(), snapshot);
            return Err(error);
        }
        Ok(Some(snapshot))
    }

    fn flush(&self) -> Result<()> {
        save_json_document(&self.path, &self.state, MUTE_LEDGER_LABEL)
    }
}
