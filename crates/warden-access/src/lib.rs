//! Moderation policy loading and access gates shared across Warden crates.

pub mod access_gates;
pub mod moderation_policy;

pub use access_gates::{
    evaluate_agent_rank_gate, evaluate_staff_gate, evaluate_toggle_gate, AccessDecision,
    ACCESS_REASON_ALLOW_AGENT_RANK, ACCESS_REASON_ALLOW_STAFF_ROLE,
    ACCESS_REASON_ALLOW_TOGGLE_ROLE, ACCESS_REASON_DENY_AGENT_RANK,
    ACCESS_REASON_DENY_STAFF_ROLE_MISSING, ACCESS_REASON_DENY_TOGGLE_ROLE_MISSING,
};
pub use moderation_policy::{
    load_moderation_policy, parse_moderation_policy, validate_moderation_policy,
    ModerationPolicyFile, DEFAULT_GRANT_DURATION_MS, MODERATION_POLICY_SCHEMA_VERSION,
};
