//! Runtime state document and the append-only event journal.
//!
//! `state.json` carries the processed-event keys (capped, oldest dropped) and
//! lifetime counters; `events.jsonl` gets one line per handled event.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use warden_store::{load_json_document, save_json_document};

pub const MODERATION_RUNTIME_STATE_SCHEMA_VERSION: u32 = 1;

const RUNTIME_STATE_LABEL: &str = "runtime state";

fn runtime_state_schema_version() -> u32 {
    MODERATION_RUNTIME_STATE_SCHEMA_VERSION
}

pub fn runtime_state_path(state_dir: &Path) -> PathBuf {
    state_dir.join("state.json")
}

pub fn event_log_path(state_dir: &Path) -> PathBuf {
    state_dir.join("events.jsonl")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Lifetime totals across runner passes.
pub struct RuntimeCounters {
    #[serde(default)]
    pub events_completed: usize,
    #[serde(default)]
    pub duplicate_skips: usize,
    #[serde(default)]
    pub commands_executed: usize,
    #[serde(default)]
    pub commands_denied: usize,
    #[serde(default)]
    pub reactions_applied: usize,
    #[serde(default)]
    pub mutes_applied: usize,
    #[serde(default)]
    pub unmutes_applied: usize,
    #[serde(default)]
    pub grants_scheduled: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModerationRuntimeState {
    #[serde(default = "runtime_state_schema_version")]
    schema_version: u32,
    #[serde(default)]
    processed_event_keys: Vec<String>,
    #[serde(default)]
    counters: RuntimeCounters,
}

impl Default for ModerationRuntimeState {
    fn default() -> Self {
        Self {
            schema_version: MODERATION_RUNTIME_STATE_SCHEMA_VERSION,
            processed_event_keys: Vec::new(),
            counters: RuntimeCounters::default(),
        }
    }
}

/// Processed-event tracking with a bounded key window.
#[derive(Debug)]
pub struct ModerationStateStore {
    path: PathBuf,
    cap: usize,
    state: ModerationRuntimeState,
    processed_index: HashSet<String>,
}

impl ModerationStateStore {
    pub fn load(path: PathBuf, cap: usize) -> Result<Self> {
        let mut state: ModerationRuntimeState = load_json_document(&path, RUNTIME_STATE_LABEL)?;
        if state.schema_version != MODERATION_RUNTIME_STATE_SCHEMA_VERSION {
            bail!(
                "unsupported runtime state schema version {} (expected {})",
                state.schema_version,
                MODERATION_RUNTIME_STATE_SCHEMA_VERSION
            );
        }

        let cap = cap.max(1);
        if state.processed_event_keys.len() > cap {
            let keep_from = state.processed_event_keys.len() - cap;
            state.processed_event_keys = state.processed_event_keys[keep_from..].to_vec();
        }
        let processed_index = state.processed_event_keys.iter().cloned().collect();
        Ok(Self {
            path,
            cap,
            state,
            processed_index,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.processed_index.contains(key)
    }

    /// Records a key; returns false when it was already tracked.
    pub fn mark_processed(&mut self, key: &str) -> bool {
        if self.processed_index.contains(key) {
            return false;
        }
        self.state.processed_event_keys.push(key.to_string());
        self.processed_index.insert(key.to_string());
        while self.state.processed_event_keys.len() > self.cap {
            let removed = self.state.processed_event_keys.remove(0);
            self.processed_index.remove(&removed);
        }
        true
    }

    pub fn counters(&self) -> &RuntimeCounters {
        &self.state.counters
    }

    pub fn counters_mut(&mut self) -> &mut RuntimeCounters {
        &mut self.state.counters
    }

    pub fn save(&self) -> Result<()> {
        save_json_document(&self.path, &self.state, RUNTIME_STATE_LABEL)
    }
}

#[derive(Clone)]
/// Append-only JSONL journal with a shared file handle.
pub struct JsonlEventLog {
    path: PathBuf,
    file: Arc<Mutex<std::fs::File>>,
}

impl JsonlEventLog {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn append<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let line = serde_json::to_string(value).context("failed to encode journal record")?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("event journal mutex is poisoned"))?;
        writeln!(file, "{line}")
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }
}
