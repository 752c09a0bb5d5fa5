//! Reaction trigger matching over the rule book.
//!
//! Matching is case-insensitive substring containment: trigger "al" hits
//! "Alice" and "practical" alike. Every matching rule fires, in registration
//! order, at most once per message.

use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::warn;
use warden_access::{evaluate_staff_gate, ModerationPolicyFile};
use warden_store::{ReactionBook, ReactionRule};

#[derive(Debug, Error)]
/// Enumerates reaction-rule command failures.
pub enum ReactionCommandError {
    #[error("requester lacks the staff role")]
    PermissionDenied { reason_code: String },
    #[error("invalid reaction rule: {detail}")]
    InvalidRule { detail: String },
    #[error("reaction book update failed: {detail}")]
    Store { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a successful `set_rule`.
pub struct SetRuleOutcome {
    pub trigger: String,
    pub symbol: String,
    pub created: bool,
}

/// Owns the in-memory rule book; mutation and evaluation share one lock.
pub struct ReactionMatcher {
    policy: ModerationPolicyFile,
    book: Mutex<ReactionBook>,
}

fn lock_unpoisoned(book: &Mutex<ReactionBook>) -> MutexGuard<'_, ReactionBook> {
    match book.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl ReactionMatcher {
    pub fn new(policy: ModerationPolicyFile, book: ReactionBook) -> Self {
        Self {
            policy,
            book: Mutex::new(book),
        }
    }

    /// Current rules in registration order.
    pub fn list_rules(&self) -> Vec<ReactionRule> {
        lock_unpoisoned(&self.book).rules().to_vec()
    }

    /// Inserts or overwrites a rule and persists the book.
    pub fn set_rule(
        &self,
        trigger: &str,
        symbol: &str,
        requester_role_ids: &[String],
    ) -> Result<SetRuleOutcome, ReactionCommandError> {
        let gate = evaluate_staff_gate(&self.policy, requester_role_ids);
        if !gate.is_allowed() {
            return Err(ReactionCommandError::PermissionDenied {
                reason_code: gate.reason_code().to_string(),
            });
        }
        let normalized = trigger.trim().to_lowercase();
        let symbol = symbol.trim().to_string();
        if normalized.is_empty() {
            return Err(ReactionCommandError::InvalidRule {
                detail: "trigger must not be empty".to_string(),
            });
        }
        if symbol.is_empty() {
            return Err(ReactionCommandError::InvalidRule {
                detail: "symbol must not be empty".to_string(),
            });
        }

        let mut book = lock_unpoisoned(&self.book);
        let created = book
            .upsert_and_flush(&normalized, &symbol)
            .map_err(|error| ReactionCommandError::Store {
                detail: format!("{error:#}"),
            })?;
        Ok(SetRuleOutcome {
            trigger: normalized,
            symbol,
            created,
        })
    }

    /// Symbols of every rule whose trigger occurs in `message_text`.
    ///
    /// Rules with a blank symbol (possible in hand-edited documents) are
    /// logged and skipped without aborting the remaining rules.
    pub fn evaluate(&self, message_text: &str) -> Vec<String> {
        let lowered = message_text.to_lowercase();
        let book = lock_unpoisoned(&self.book);
        let mut symbols = Vec::new();
        for rule in book.rules() {
            if rule.symbol.trim().is_empty() {
                warn!(trigger = %rule.trigger, "skipping reaction rule with blank symbol");
                continue;
            }
            if lowered.contains(&rule.trigger) {
                symbols.push(rule.symbol.clone());
            }
        }
        symbols
    }
}
