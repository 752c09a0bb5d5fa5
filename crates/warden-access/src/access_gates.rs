//! Access decisions for privileged commands.
//!
//! Gates return decision values rather than errors; the dispatcher turns a
//! deny into a private reply and the journal records the reason code.

use serde::Serialize;

use crate::moderation_policy::ModerationPolicyFile;

pub const ACCESS_REASON_ALLOW_STAFF_ROLE: &str = "allow_staff_role";
pub const ACCESS_REASON_DENY_STAFF_ROLE_MISSING: &str = "deny_staff_role_missing";
pub const ACCESS_REASON_ALLOW_TOGGLE_ROLE: &str = "allow_toggle_role";
pub const ACCESS_REASON_DENY_TOGGLE_ROLE_MISSING: &str = "deny_toggle_role_missing";
pub const ACCESS_REASON_ALLOW_AGENT_RANK: &str = "allow_agent_rank_above_target";
pub const ACCESS_REASON_DENY_AGENT_RANK: &str = "deny_agent_rank_not_above_target";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
/// Outcome of an access gate evaluation.
pub enum AccessDecision {
    Allow { reason_code: String },
    Deny { reason_code: String },
}

impl AccessDecision {
    fn allow(reason_code: &str) -> Self {
        Self::Allow {
            reason_code: reason_code.to_string(),
        }
    }

    fn deny(reason_code: &str) -> Self {
        Self::Deny {
            reason_code: reason_code.to_string(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    pub fn reason_code(&self) -> &str {
        match self {
            Self::Allow { reason_code } | Self::Deny { reason_code } => reason_code,
        }
    }
}

/// Staff gate: mute/unmute/restrict and reaction-rule mutation.
pub fn evaluate_staff_gate(
    policy: &ModerationPolicyFile,
    actor_role_ids: &[String],
) -> AccessDecision {
    if policy.is_staff(actor_role_ids) {
        AccessDecision::allow(ACCESS_REASON_ALLOW_STAFF_ROLE)
    } else {
        AccessDecision::deny(ACCESS_REASON_DENY_STAFF_ROLE_MISSING)
    }
}

/// Toggle gate: event open/close and grant-role.
pub fn evaluate_toggle_gate(
    policy: &ModerationPolicyFile,
    actor_role_ids: &[String],
) -> AccessDecision {
    if policy.holds_toggle_role(actor_role_ids) {
        AccessDecision::allow(ACCESS_REASON_ALLOW_TOGGLE_ROLE)
    } else {
        AccessDecision::deny(ACCESS_REASON_DENY_TOGGLE_ROLE_MISSING)
    }
}

/// Hierarchy gate: the agent may only manage members ranked strictly below it.
pub fn evaluate_agent_rank_gate(agent_rank: i64, target_rank: i64) -> AccessDecision {
    if agent_rank > target_rank {
        AccessDecision::allow(ACCESS_REASON_ALLOW_AGENT_RANK)
    } else {
        AccessDecision::deny(ACCESS_REASON_DENY_AGENT_RANK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation_policy::{ModerationPolicyFile, MODERATION_POLICY_SCHEMA_VERSION};

    fn policy() -> ModerationPolicyFile {
        ModerationPolicyFile {
            schema_version: MODERATION_POLICY_SCHEMA_VERSION,
            staff_role_id: "role-staff".to_string(),
            mute_role_id: "role-muted".to_string(),
            everyone_role_id: "role-everyone".to_string(),
            toggle_role_ids: vec!["role-staff".to_string(), "role-helper".to_string()],
            grant_role_id: "role-event".to_string(),
            grant_duration_ms: 1_000,
            restricted_channel_ids: Vec::new(),
            command_channel_ids: Vec::new(),
        }
    }

    fn roles(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn unit_staff_gate_allows_staff_role() {
        let decision = evaluate_staff_gate(&policy(), &roles(&["role-member", "role-staff"]));
        assert!(decision.is_allowed());
        assert_eq!(decision.reason_code(), ACCESS_REASON_ALLOW_STAFF_ROLE);
    }

    #[test]
    fn unit_staff_gate_denies_without_staff_role() {
        let decision = evaluate_staff_gate(&policy(), &roles(&["role-member"]));
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason_code(), ACCESS_REASON_DENY_STAFF_ROLE_MISSING);
    }

    #[test]
    fn unit_toggle_gate_allows_any_listed_role() {
        let decision = evaluate_toggle_gate(&policy(), &roles(&["role-helper"]));
        assert!(decision.is_allowed());
        assert_eq!(decision.reason_code(), ACCESS_REASON_ALLOW_TOGGLE_ROLE);
    }

    #[test]
    fn unit_toggle_gate_denies_unlisted_roles() {
        let decision = evaluate_toggle_gate(&policy(), &roles(&["role-member"]));
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason_code(), ACCESS_REASON_DENY_TOGGLE_ROLE_MISSING);
    }

    #[test]
    fn unit_rank_gate_requires_strictly_higher_agent() {
        assert!(evaluate_agent_rank_gate(10, 5).is_allowed());
        assert!(!evaluate_agent_rank_gate(5, 5).is_allowed());
        assert!(!evaluate_agent_rank_gate(4, 5).is_allowed());
    }

    #[test]
    fn unit_decision_serializes_with_tag() {
        let decision = evaluate_agent_rank_gate(1, 9);
        let rendered = serde_json::to_string(&decision).expect("serialize");
        assert!(rendered.contains("\"decision\":\"deny\""));
        assert!(rendered.contains(ACCESS_REASON_DENY_AGENT_RANK));
    }
}
