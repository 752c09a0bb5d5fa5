//! Timed role grants: add a role now, remove it after a fixed delay.
//!
//! Grants live only in process memory. A restart loses the timer and the role
//! stays assigned; that durability gap is accepted and documented rather than
//! papered over with persistence.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use warden_access::{evaluate_toggle_gate, ModerationPolicyFile};
use warden_core::current_unix_timestamp_ms;
use warden_gateway::{GatewayError, GuildGateway};

#[derive(Debug, Error)]
/// Enumerates grant failures.
pub enum GrantError {
    #[error("requester lacks a granting role")]
    PermissionDenied { reason_code: String },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Inspection record for one live grant.
pub struct GrantReceipt {
    pub user_id: String,
    pub role_id: String,
    pub granted_at_ms: u64,
    pub expires_at_ms: u64,
}

struct ActiveGrant {
    receipt: GrantReceipt,
    grant_seq: u64,
    expiry_task: JoinHandle<()>,
}

type GrantRegistry = BTreeMap<(String, String), ActiveGrant>;

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Grants the policy's event role and schedules its automatic removal.
///
/// The registry is keyed by (user_id, role_id). Re-granting a live key aborts
/// the old timer and replaces it, so the expiry resets instead of firing
/// twice. Handles stay in the registry while the timer runs; there is no
/// cancellation surface yet.
pub struct GrantScheduler {
    policy: ModerationPolicyFile,
    gateway: Arc<dyn GuildGateway>,
    registry: Arc<Mutex<GrantRegistry>>,
    next_grant_seq: AtomicU64,
}

impl GrantScheduler {
    pub fn new(policy: ModerationPolicyFile, gateway: Arc<dyn GuildGateway>) -> Self {
        Self {
            policy,
            gateway,
            registry: Arc::new(Mutex::new(BTreeMap::new())),
            next_grant_seq: AtomicU64::new(0),
        }
    }

    /// Live grants in (user_id, role_id) order.
    pub fn pending(&self) -> Vec<GrantReceipt> {
        lock_unpoisoned(&self.registry)
            .values()
            .map(|grant| grant.receipt.clone())
            .collect()
    }

    pub async fn grant(
        &self,
        target_user_id: &str,
        requester_role_ids: &[String],
    ) -> Result<GrantReceipt, GrantError> {
        let gate = evaluate_toggle_gate(&self.policy, requester_role_ids);
        if !gate.is_allowed() {
            return Err(GrantError::PermissionDenied {
                reason_code: gate.reason_code().to_string(),
            });
        }

        let role_id = self.policy.grant_role_id.clone();
        self.gateway
            .add_roles(target_user_id, std::slice::from_ref(&role_id))
            .await?;

        let granted_at_ms = current_unix_timestamp_ms();
        let receipt = GrantReceipt {
            user_id: target_user_id.to_string(),
            role_id: role_id.clone(),
            granted_at_ms,
            expires_at_ms: granted_at_ms.saturating_add(self.policy.grant_duration_ms),
        };
        let grant_seq = self.next_grant_seq.fetch_add(1, Ordering::Relaxed);
        let key = (receipt.user_id.clone(), receipt.role_id.clone());

        // The lock spans abort-old through insert-new so the expiry task's
        // cleanup can never observe the registry between those steps.
        let mut registry = lock_unpoisoned(&self.registry);
        if let Some(previous) = registry.remove(&key) {
            previous.expiry_task.abort();
            debug!(
                user_id = %receipt.user_id,
                role_id = %receipt.role_id,
                "replacing live grant timer"
            );
        }
        let expiry_task = spawn_expiry_task(
            Arc::clone(&self.gateway),
            Arc::clone(&self.registry),
            receipt.clone(),
            grant_seq,
            Duration::from_millis(self.policy.grant_duration_ms),
        );
        registry.insert(
            key,
            ActiveGrant {
                receipt: receipt.clone(),
                grant_seq,
                expiry_task,
            },
        );

        Ok(receipt)
    }
}

fn spawn_expiry_task(
    gateway: Arc<dyn GuildGateway>,
    registry: Arc<Mutex<GrantRegistry>>,
    receipt: GrantReceipt,
    grant_seq: u64,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // Blind removal: the target's other roles may have changed since the
        // grant and that must not matter here.
        if let Err(error) = gateway
            .remove_roles(&receipt.user_id, std::slice::from_ref(&receipt.role_id))
            .await
        {
            warn!(
                user_id = %receipt.user_id,
                role_id = %receipt.role_id,
                error = %error,
                "grant expiry could not remove the role"
            );
        }
        let mut registry = lock_unpoisoned(&registry);
        let key = (receipt.user_id, receipt.role_id);
        // A replacement grant may have raced this cleanup; only the task
        // holding the live sequence number clears the entry.
        let owns_entry = registry
            .get(&key)
            .is_some_and(|entry| entry.grant_seq == grant_seq);
        if owns_entry {
            registry.remove(&key);
        }
    })
}
