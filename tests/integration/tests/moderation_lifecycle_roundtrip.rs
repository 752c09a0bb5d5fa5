use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use serde_json::{json, Value};
use warden_contract::load_guild_contract_fixture;
use warden_runtime::{
    run_moderation_contract_runner, run_moderation_validation, ModerationRuntime,
    ModerationRuntimeConfig,
};
use warden_store::{mute_ledger_path, MuteLedger};

static WORKSPACE_COUNTER: AtomicU64 = AtomicU64::new(1);

struct IsolatedWorkspace {
    root: PathBuf,
}

impl IsolatedWorkspace {
    fn new(label: &str) -> Self {
        let tick = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let count = WORKSPACE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "warden-{label}-{}-{tick}-{count}",
            std::process::id()
        ));
        fs::create_dir_all(&root).expect("must create isolated workspace root");
        Self { root }
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for IsolatedWorkspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn write_json(path: &Path, value: &Value) {
    fs::write(
        path,
        serde_json::to_string_pretty(value).expect("serialize document"),
    )
    .expect("write document");
}

fn write_guild_documents(root: &Path) {
    write_json(
        &root.join("policy.json"),
        &json!({
            "schema_version": 1,
            "staff_role_id": "role-staff",
            "mute_role_id": "role-muted",
            "everyone_role_id": "role-everyone",
            "toggle_role_ids": ["role-staff"],
            "grant_role_id": "role-event-access",
            "grant_duration_ms": 60_000,
            "restricted_channel_ids": [],
            "command_channel_ids": ["chan-cmd"]
        }),
    );
    write_json(
        &root.join("guild.json"),
        &json!({
            "schema_version": 1,
            "agent_user_id": "agent-1",
            "members": [
                {
                    "user_id": "agent-1",
                    "display_name": "Warden",
                    "role_ids": ["role-agent"],
                    "top_role_rank": 50,
                    "is_bot": true
                },
                {
                    "user_id": "staff-1",
                    "display_name": "Staff One",
                    "role_ids": ["role-staff"],
                    "top_role_rank": 10,
                    "is_bot": false
                },
                {
                    "user_id": "user-1",
                    "display_name": "User One",
                    "role_ids": ["role-silver", "role-gold"],
                    "top_role_rank": 5,
                    "is_bot": false
                }
            ],
            "channel_ids": ["chan-cmd", "chan-general"]
        }),
    );
}

fn write_fixture(root: &Path, file_name: &str, events: Vec<Value>) -> PathBuf {
    let path = root.join(file_name);
    write_json(
        &path,
        &json!({
            "schema_version": 1,
            "name": file_name,
            "events": events
        }),
    );
    path
}

fn mute_command_event(event_id: &str, name: &str, timestamp_ms: u64) -> Value {
    json!({
        "schema_version": 1,
        "event_kind": "command",
        "event_id": event_id,
        "channel_id": "chan-general",
        "actor_id": "staff-1",
        "actor_role_ids": ["role-staff"],
        "timestamp_ms": timestamp_ms,
        "command": {"name": name, "args": {"user": "user-1"}}
    })
}

fn message_event(event_id: &str, actor_id: &str, roles: Value, timestamp_ms: u64, text: &str) -> Value {
    json!({
        "schema_version": 1,
        "event_kind": "message",
        "event_id": event_id,
        "channel_id": "chan-cmd",
        "actor_id": actor_id,
        "actor_role_ids": roles,
        "timestamp_ms": timestamp_ms,
        "text": text
    })
}

fn config_for(root: &Path, events_path: PathBuf) -> ModerationRuntimeConfig {
    ModerationRuntimeConfig {
        events_path,
        guild_path: root.join("guild.json"),
        policy_path: root.join("policy.json"),
        state_dir: root.join("state"),
        queue_limit: 64,
        processed_event_cap: 1_024,
    }
}

#[tokio::test]
async fn integration_mute_survives_restart_and_unmute_restores_roles() {
    let workspace = IsolatedWorkspace::new("mute-restart");
    write_guild_documents(workspace.root());

    let mute_fixture_path = write_fixture(
        workspace.root(),
        "events-mute.json",
        vec![mute_command_event("evt-mute-1", "mute", 1_000)],
    );
    let mute_fixture = load_guild_contract_fixture(&mute_fixture_path).expect("mute fixture");
    let mut first_run =
        ModerationRuntime::new(config_for(workspace.root(), mute_fixture_path)).expect("runtime");
    let first_summary = first_run
        .run_once_fixture(&mute_fixture)
        .await
        .expect("first pass");
    assert_eq!(first_summary.mutes_applied, 1);
    assert!(first_run.is_muted("user-1"));
    drop(first_run);

    // The second process starts from the platform snapshot plus the durable
    // ledger; the snapshot persisted on disk is what drives the restore.
    let unmute_fixture_path = write_fixture(
        workspace.root(),
        "events-unmute.json",
        vec![mute_command_event("evt-unmute-1", "unmute", 2_000)],
    );
    let unmute_fixture = load_guild_contract_fixture(&unmute_fixture_path).expect("unmute fixture");
    let mut second_run = ModerationRuntime::new(config_for(workspace.root(), unmute_fixture_path))
        .expect("restarted runtime");
    assert!(second_run.is_muted("user-1"));

    let second_summary = second_run
        .run_once_fixture(&unmute_fixture)
        .await
        .expect("second pass");
    assert_eq!(second_summary.unmutes_applied, 1);
    assert!(!second_run.is_muted("user-1"));

    let roles = second_run
        .gateway()
        .member_role_ids("user-1")
        .expect("member roles");
    assert!(roles.contains(&"role-silver".to_string()));
    assert!(roles.contains(&"role-gold".to_string()));
    assert!(!roles.contains(&"role-muted".to_string()));

    let state_dir = workspace.root().join("state");
    let ledger = MuteLedger::load(mute_ledger_path(&state_dir)).expect("reload ledger");
    assert_eq!(ledger.muted_user_count(), 0);

    let journal = fs::read_to_string(state_dir.join("events.jsonl")).expect("read journal");
    assert_eq!(journal.lines().count(), 2);

    let state: Value = serde_json::from_str(
        &fs::read_to_string(state_dir.join("state.json")).expect("read runtime state"),
    )
    .expect("parse runtime state");
    assert_eq!(state["counters"]["events_completed"].as_u64(), Some(2));
    assert_eq!(state["counters"]["mutes_applied"].as_u64(), Some(1));
    assert_eq!(state["counters"]["unmutes_applied"].as_u64(), Some(1));
}

#[tokio::test]
async fn integration_reaction_rules_created_in_one_pass_fire_in_the_next() {
    let workspace = IsolatedWorkspace::new("reaction-durability");
    write_guild_documents(workspace.root());

    let set_fixture_path = write_fixture(
        workspace.root(),
        "events-set.json",
        vec![message_event(
            "evt-set-1",
            "staff-1",
            json!(["role-staff"]),
            1_000,
            "/reactions-set welcome 👋",
        )],
    );
    let set_fixture = load_guild_contract_fixture(&set_fixture_path).expect("set fixture");
    let mut first_run =
        ModerationRuntime::new(config_for(workspace.root(), set_fixture_path)).expect("runtime");
    let first_summary = first_run
        .run_once_fixture(&set_fixture)
        .await
        .expect("first pass");
    assert_eq!(first_summary.commands_executed, 1);
    drop(first_run);

    let message_fixture_path = write_fixture(
        workspace.root(),
        "events-message.json",
        vec![message_event(
            "evt-msg-1",
            "user-1",
            json!(["role-silver"]),
            2_000,
            "welcome to the guild!",
        )],
    );
    let message_fixture =
        load_guild_contract_fixture(&message_fixture_path).expect("message fixture");
    let mut second_run = ModerationRuntime::new(config_for(workspace.root(), message_fixture_path))
        .expect("restarted runtime");
    let second_summary = second_run
        .run_once_fixture(&message_fixture)
        .await
        .expect("second pass");

    assert_eq!(second_summary.reactions_applied, 1);
    let reactions = second_run.gateway().reactions();
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].symbol, "👋");
    assert_eq!(reactions[0].message_id, "evt-msg-1");
}

#[tokio::test]
async fn integration_validate_then_run_produces_runtime_state() {
    let workspace = IsolatedWorkspace::new("validate-run");
    write_guild_documents(workspace.root());
    let events_path = write_fixture(
        workspace.root(),
        "events.json",
        vec![message_event(
            "evt-msg-1",
            "user-1",
            json!(["role-silver"]),
            1_000,
            "hello there",
        )],
    );

    run_moderation_validation(
        &events_path,
        &workspace.root().join("guild.json"),
        &workspace.root().join("policy.json"),
    )
    .expect("validation passes");

    run_moderation_contract_runner(config_for(workspace.root(), events_path))
        .await
        .expect("runner pass");

    let state_dir = workspace.root().join("state");
    assert!(state_dir.join("state.json").exists());
    assert!(state_dir.join("events.jsonl").exists());
}
