//! Shared load/save plumbing for the durable JSON documents.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use warden_core::write_text_atomic;

/// Loads a whole-document JSON value, falling back to the default when the
/// file does not exist yet.
pub fn load_json_document<T>(path: &Path, label: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {label} document {}", path.display()))?;
    serde_json::from_str::<T>(&raw)
        .with_context(|| format!("failed to parse {label} document {}", path.display()))
}

/// Serializes the full in-memory value back to its document.
pub fn save_json_document<T>(path: &Path, value: &T, label: &str) -> Result<()>
where
    T: Serialize,
{
    let mut payload = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {label} document"))?;
    payload.push('\n');
    write_text_atomic(path, &payload)
        .with_context(|| format!("failed to write {label} document {}", path.display()))
}
