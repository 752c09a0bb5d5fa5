//! Mute state machine: snapshot roles on mute, restore them on unmute.
//!
//! Ordering invariants:
//! - mute: roles are removed before the mute role is added; the snapshot is
//!   persisted between the two. A failure after removal leaves the member
//!   stripped but untagged, surfaced to the caller and never auto-retried.
//! - unmute: the snapshot is deleted and the deletion persisted before any
//!   restore call, so a retry can never double-apply a snapshot. Restoration
//!   happens before the mute role is removed.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::debug;
use warden_access::{evaluate_agent_rank_gate, evaluate_staff_gate, ModerationPolicyFile};
use warden_gateway::{GatewayError, GuildGateway};
use warden_store::MuteLedger;

#[derive(Debug, Error)]
/// Enumerates mute/unmute failures.
pub enum ModerationError {
    #[error("requester lacks the staff role")]
    PermissionDenied { reason_code: String },
    #[error("agent rank {agent_rank} does not exceed target rank {target_rank}")]
    RankTooLow { agent_rank: i64, target_rank: i64 },
    #[error("member '{user_id}' is already muted")]
    AlreadyMuted { user_id: String },
    #[error("a mute transition for '{user_id}' is already in progress")]
    AlreadyInProgress { user_id: String },
    #[error("mute ledger update failed: {detail}")]
    Store { detail: String },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolved inputs for one mute command.
pub struct MuteRequest {
    pub target_user_id: String,
    /// The target's current roles as fetched at dispatch time.
    pub target_role_ids: Vec<String>,
    pub requester_role_ids: Vec<String>,
    /// Highest role rank of the automation agent, not the human requester.
    pub agent_rank: i64,
    pub target_rank: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolved inputs for one unmute command.
pub struct UnmuteRequest {
    pub target_user_id: String,
    pub requester_role_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteOutcome {
    pub user_id: String,
    pub snapshot_role_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmuteOutcome {
    pub user_id: String,
    pub restored_role_ids: Vec<String>,
    /// False when no snapshot existed; the mute role is still removed.
    pub had_snapshot: bool,
}

/// Coordinates mute/unmute sequences against the gateway and the ledger.
///
/// Safe under parallel dispatch: the ledger lock is held only around
/// synchronous store calls, and a per-user in-flight set rejects a second
/// transition for the same member while one is still running.
pub struct MuteCoordinator {
    policy: ModerationPolicyFile,
    ledger: Mutex<MuteLedger>,
    in_flight: Arc<Mutex<BTreeSet<String>>>,
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

struct InFlightGuard {
    set: Arc<Mutex<BTreeSet<String>>>,
    user_id: String,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<BTreeSet<String>>>, user_id: &str) -> Option<Self> {
        let mut guard = lock_unpoisoned(set);
        if !guard.insert(user_id.to_string()) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            user_id: user_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock_unpoisoned(&self.set).remove(&self.user_id);
    }
}

impl MuteCoordinator {
    pub fn new(policy: ModerationPolicyFile, ledger: MuteLedger) -> Self {
        Self {
            policy,
            ledger: Mutex::new(ledger),
            in_flight: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    pub fn is_muted(&self, user_id: &str) -> bool {
        lock_unpoisoned(&self.ledger).is_muted(user_id)
    }

    pub fn muted_user_count(&self) -> usize {
        lock_unpoisoned(&self.ledger).muted_user_count()
    }

    /// Roles the mute snapshot will capture: everything except the everyone
    /// pseudo-role and the mute role itself.
    fn snapshot_roles(&self, role_ids: &[String]) -> Vec<String> {
        role_ids
            .iter()
            .filter(|role_id| {
                role_id.as_str() != self.policy.everyone_role_id
                    && role_id.as_str() != self.policy.mute_role_id
            })
            .cloned()
            .collect()
    }

    pub async fn mute(
        &self,
        gateway: &dyn GuildGateway,
        request: &MuteRequest,
    ) -> Result<MuteOutcome, ModerationError> {
        let gate = evaluate_staff_gate(&self.policy, &request.requester_role_ids);
        if !gate.is_allowed() {
            return Err(ModerationError::PermissionDenied {
                reason_code: gate.reason_code().to_string(),
            });
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, &request.target_user_id).ok_or(
            ModerationError::AlreadyInProgress {
                user_id: request.target_user_id.clone(),
            },
        )?;

        let rank_gate = evaluate_agent_rank_gate(request.agent_rank, request.target_rank);
        if !rank_gate.is_allowed() {
            return Err(ModerationError::RankTooLow {
                agent_rank: request.agent_rank,
                target_rank: request.target_rank,
            });
        }

        if self.is_muted(&request.target_user_id) {
            return Err(ModerationError::AlreadyMuted {
                user_id: request.target_user_id.clone(),
            });
        }

        let snapshot = self.snapshot_roles(&request.target_role_ids);
        if !snapshot.is_empty() {
            gateway
                .remove_roles(&request.target_user_id, &snapshot)
                .await?;
        }

        {
            let mut ledger = lock_unpoisoned(&self.ledger);
            ledger
                .record_and_flush(&request.target_user_id, snapshot.clone())
                .map_err(|error| ModerationError::Store {
                    detail: format!("{error:#}"),
                })?;
        }

        gateway
            .add_roles(
                &request.target_user_id,
                std::slice::from_ref(&self.policy.mute_role_id),
            )
            .await?;

        debug!(
            user_id = %request.target_user_id,
            snapshot_len = snapshot.len(),
            "mute applied"
        );
        Ok(MuteOutcome {
            user_id: request.target_user_id.clone(),
            snapshot_role_ids: snapshot,
        })
    }

    pub async fn unmute(
        &self,
        gateway: &dyn GuildGateway,
        request: &UnmuteRequest,
    ) -> Result<UnmuteOutcome, ModerationError> {
        let gate = evaluate_staff_gate(&self.policy, &request.requester_role_ids);
        if !gate.is_allowed() {
            return Err(ModerationError::PermissionDenied {
                reason_code: gate.reason_code().to_string(),
            });
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, &request.target_user_id).ok_or(
            ModerationError::AlreadyInProgress {
                user_id: request.target_user_id.clone(),
            },
        )?;

        let snapshot = {
            let mut ledger = lock_unpoisoned(&self.ledger);
            ledger
                .take_and_flush(&request.target_user_id)
                .map_err(|error| ModerationError::Store {
                    detail: format!("{error:#}"),
                })?
        };
        let had_snapshot = snapshot.is_some();
        let restored = snapshot.unwrap_or_default();

        if !restored.is_empty() {
            gateway
                .add_roles(&request.target_user_id, &restored)
                .await?;
        }

        gateway
            .remove_roles(
                &request.target_user_id,
                std::slice::from_ref(&self.policy.mute_role_id),
            )
            .await?;

        debug!(
            user_id = %request.target_user_id,
            restored_len = restored.len(),
            had_snapshot,
            "unmute applied"
        );
        Ok(UnmuteOutcome {
            user_id: request.target_user_id.clone(),
            restored_role_ids: restored,
            had_snapshot,
        })
    }
}
