//! Reaction rule book: ordered trigger→symbol rules behind a flush lifecycle.
//!
//! Rules keep their registration order across overwrites and reloads; the
//! matcher depends on that order when several triggers hit one message.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::document_io::{load_json_document, save_json_document};

pub const REACTION_BOOK_SCHEMA_VERSION: u32 = 1;

const REACTION_BOOK_LABEL: &str = "reaction book";

fn reaction_book_schema_version() -> u32 {
    REACTION_BOOK_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One trigger→symbol mapping.
pub struct ReactionRule {
    pub trigger: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReactionBookState {
    #[serde(default = "reaction_book_schema_version")]
    schema_version: u32,
    #[serde(default)]
    rules: Vec<ReactionRule>,
}

impl Default for ReactionBookState {
    fn default() -> Self {
        Self {
            schema_version: REACTION_BOOK_SCHEMA_VERSION,
            rules: Vec::new(),
        }
    }
}

pub fn reaction_book_path(state_dir: &Path) -> PathBuf {
    state_dir.join("reactions.json")
}

/// Process-owned cache of the reaction document.
#[derive(Debug)]
pub struct ReactionBook {
    path: PathBuf,
    state: ReactionBookState,
}

impl ReactionBook {
    pub fn load(path: PathBuf) -> Result<Self> {
        let mut state: ReactionBookState = load_json_document(&path, REACTION_BOOK_LABEL)?;
        if state.schema_version != REACTION_BOOK_SCHEMA_VERSION {
            bail!(
                "unsupported reaction book schema version {} (expected {})",
                state.schema_version,
                REACTION_BOOK_SCHEMA_VERSION
            );
        }
        normalize_rules(&mut state.rules)?;
        Ok(Self { path, state })
    }

    pub fn rules(&self) -> &[ReactionRule] {
        &self.state.rules
    }

    pub fn rule_count(&self) -> usize {
        self.state.rules.len()
    }

    /// Inserts or overwrites the rule for `trigger` (lowercased) and persists
    /// the full book. An overwrite keeps the rule's original position.
    /// Returns true when the trigger was new.
    pub fn upsert_and_flush(&mut self, trigger: &str, symbol: &str) -> Result<bool> {
        let normalized = trigger.trim().to_lowercase();
        if normalized.is_empty() {
            bail!("reaction trigger must not be empty");
        }
        let symbol = symbol.trim();
        if symbol.is_empty() {
            bail!("reaction symbol must not be empty");
        }

        let existing = self
            .state
            .rules
            .iter_mut()
            .find(|rule| rule.trigger == normalized);
        let (created, previous) = match existing {
            Some(rule) => {
                let previous = rule.symbol.clone();
                rule.symbol = symbol.to_string();
                (false, Some(previous))
            }
            None => {
                self.state.rules.push(ReactionRule {
                    trigger: normalized.clone(),
                    symbol: symbol.to_string(),
                });
                (true, None)
            }
        };

        if let Err(error) = self.flush() {
            // Cache and document must agree; undo the mutation on a failed flush.
            match previous {
                Some(previous) => {
                    if let Some(rule) = self
                        .state
                        .rules
                        .iter_mut()
                        .find(|rule| rule.trigger == normalized)
                    {
                        rule.symbol = previous;
                    }
                }
                None => {
                    self.state.rules.retain(|rule| rule.trigger != normalized);
                }
            }
            return Err(error);
        }
        Ok(created)
    }

    fn flush(&self) -> Result<()> {
        save_json_document(&self.path, &self.state, REACTION_BOOK_LABEL)
    }
}

/// Rewrites each trigger to its trimmed lowercase form. The book keys on the
/// lowercased trigger, so a hand-edited `"GG"` becomes `"gg"` rather than a
/// rule no message can ever match.
fn normalize_rules(rules: &mut [ReactionRule]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for rule in rules {
        let normalized = rule.trigger.trim().to_lowercase();
        if normalized.is_empty() {
            bail!("reaction book contains a rule with an empty trigger");
        }
        if !seen.insert(normalized.clone()) {
            bail!("reaction book contains duplicate trigger '{normalized}'");
        }
        rule.trigger = normalized;
        // Blank symbols are tolerated here: hand-edited documents must not
        // block startup. Evaluation logs and skips such rules.
    }
    Ok(())
}
