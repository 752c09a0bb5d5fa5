//! Moderation runtime: event dispatch, the contract runner, and run state.
//!
//! Wires the contract, access, store, gateway, moderation, reaction, and
//! grant crates into a single fixture-driven pass with durable dedupe
//! tracking and an append-only event journal.

pub mod moderation_runtime;
pub mod runtime_state;

pub use moderation_runtime::{
    run_moderation_contract_runner, run_moderation_validation, ModerationRunSummary,
    ModerationRuntime, ModerationRuntimeConfig,
};
pub use runtime_state::{
    event_log_path, runtime_state_path, JsonlEventLog, ModerationStateStore, RuntimeCounters,
    MODERATION_RUNTIME_STATE_SCHEMA_VERSION,
};
