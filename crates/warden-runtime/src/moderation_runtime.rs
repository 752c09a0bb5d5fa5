//! Moderation dispatcher and the fixture-driven contract runner.
//!
//! Events are handled one at a time in arrival order. Each event resolves to
//! at most one tagged command; message events in command channels also flow
//! through reaction evaluation. Every handled event is journaled and marked
//! processed, success or failure, so a later pass never re-runs a multi-step
//! moderation sequence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;
use warden_access::{
    evaluate_staff_gate, evaluate_toggle_gate, load_moderation_policy, ModerationPolicyFile,
    ACCESS_REASON_DENY_AGENT_RANK,
};
use warden_contract::{
    event_dedupe_key, load_guild_contract_fixture, parse_prefix_command,
    resolve_command_invocation, GuildCommand, GuildContractFixture, GuildEventKind,
    GuildInboundEvent, COMMAND_EVENT_CLOSE, COMMAND_EVENT_OPEN, COMMAND_GRANT_ROLE, COMMAND_MUTE,
    COMMAND_REACTIONS, COMMAND_REACTIONS_SET, COMMAND_RESTRICT, COMMAND_UNMUTE,
    GUILD_COMMAND_CATALOG,
};
use warden_core::current_unix_timestamp_ms;
use warden_gateway::{
    load_guild_snapshot, GatewayError, GuildGateway, GuildMember, InMemoryGuildGateway,
};
use warden_grants::{GrantError, GrantReceipt, GrantScheduler};
use warden_moderation::{ModerationError, MuteCoordinator, MuteRequest, UnmuteRequest};
use warden_reactions::{ReactionCommandError, ReactionMatcher};
use warden_store::{
    channel_allowlist_path, mute_ledger_path, reaction_book_path, ChannelAllowlist, MuteLedger,
    ReactionBook, ReactionRule,
};

use crate::runtime_state::{
    event_log_path, runtime_state_path, JsonlEventLog, ModerationStateStore,
};

const STATUS_OK: &str = "ok";
const STATUS_DENIED: &str = "denied";
const STATUS_INVALID: &str = "invalid";
const STATUS_NOT_FOUND: &str = "not_found";
const STATUS_FAILED: &str = "failed";
const STATUS_SKIPPED: &str = "skipped";
const STATUS_NO_ACTION: &str = "no_action";

#[derive(Debug, Clone)]
/// Inputs for one contract-runner pass.
pub struct ModerationRuntimeConfig {
    pub events_path: PathBuf,
    pub guild_path: PathBuf,
    pub policy_path: PathBuf,
    pub state_dir: PathBuf,
    pub queue_limit: usize,
    pub processed_event_cap: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Per-pass totals reported by the runner.
pub struct ModerationRunSummary {
    pub discovered_events: usize,
    pub queued_events: usize,
    pub completed_events: usize,
    pub duplicate_skips: usize,
    pub bot_skips: usize,
    pub commands_executed: usize,
    pub commands_denied: usize,
    pub commands_invalid: usize,
    pub commands_not_found: usize,
    pub commands_failed: usize,
    pub reactions_applied: usize,
    pub reaction_failures: usize,
    pub replies_sent: usize,
    pub mutes_applied: usize,
    pub unmutes_applied: usize,
    pub grants_scheduled: usize,
}

#[derive(Debug)]
struct CommandExecution {
    command_name: &'static str,
    status: &'static str,
    reason_code: String,
    response_text: String,
    reply_private: bool,
}

impl CommandExecution {
    fn base(
        command_name: &'static str,
        status: &'static str,
        reason_code: &str,
        response_text: String,
        reply_private: bool,
    ) -> Self {
        Self {
            command_name,
            status,
            reason_code: reason_code.to_string(),
            response_text,
            reply_private,
        }
    }

    fn succeeded(command_name: &'static str, reason_code: &str, response_text: String) -> Self {
        Self::base(command_name, STATUS_OK, reason_code, response_text, false)
    }

    fn denied(command_name: &'static str, reason_code: &str, response_text: String) -> Self {
        Self::base(command_name, STATUS_DENIED, reason_code, response_text, true)
    }

    fn invalid(command_name: &'static str, reason_code: &str, response_text: String) -> Self {
        Self::base(command_name, STATUS_INVALID, reason_code, response_text, true)
    }

    fn not_found(command_name: &'static str, reason_code: &str, response_text: String) -> Self {
        Self::base(
            command_name,
            STATUS_NOT_FOUND,
            reason_code,
            response_text,
            true,
        )
    }

    fn failed(command_name: &'static str, reason_code: &str, response_text: String) -> Self {
        Self::base(command_name, STATUS_FAILED, reason_code, response_text, true)
    }
}

#[derive(Debug)]
struct EventReport {
    action: String,
    status: &'static str,
    reason_code: String,
    reactions_applied: usize,
    reaction_failures: usize,
    reply_sent: bool,
}

#[derive(Debug, Serialize)]
struct EventJournalRecord {
    timestamp_unix_ms: u64,
    event_key: String,
    event_kind: String,
    channel_id: String,
    actor_id: String,
    action: String,
    status: String,
    reason_code: String,
    reactions_applied: usize,
    reaction_failures: usize,
}

/// Dispatcher wired to the in-memory gateway and the durable documents.
pub struct ModerationRuntime {
    config: ModerationRuntimeConfig,
    policy: ModerationPolicyFile,
    gateway: Arc<InMemoryGuildGateway>,
    matcher: ReactionMatcher,
    coordinator: MuteCoordinator,
    grants: GrantScheduler,
    allowlist: ChannelAllowlist,
    state: ModerationStateStore,
    event_log: JsonlEventLog,
}

impl ModerationRuntime {
    pub fn new(config: ModerationRuntimeConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.state_dir)
            .with_context(|| format!("failed to create {}", config.state_dir.display()))?;
        let policy = load_moderation_policy(&config.policy_path)?;
        let snapshot = load_guild_snapshot(&config.guild_path)?;
        let gateway = Arc::new(InMemoryGuildGateway::from_snapshot(&snapshot));
        let ledger = MuteLedger::load(mute_ledger_path(&config.state_dir))?;
        let book = ReactionBook::load(reaction_book_path(&config.state_dir))?;
        let allowlist = ChannelAllowlist::load(channel_allowlist_path(&config.state_dir))?;
        let state = ModerationStateStore::load(
            runtime_state_path(&config.state_dir),
            config.processed_event_cap,
        )?;
        let event_log = JsonlEventLog::open(event_log_path(&config.state_dir))?;

        let matcher = ReactionMatcher::new(policy.clone(), book);
        let coordinator = MuteCoordinator::new(policy.clone(), ledger);
        let grants = GrantScheduler::new(
            policy.clone(),
            Arc::clone(&gateway) as Arc<dyn GuildGateway>,
        );
        Ok(Self {
            config,
            policy,
            gateway,
            matcher,
            coordinator,
            grants,
            allowlist,
            state,
            event_log,
        })
    }

    pub fn gateway(&self) -> &InMemoryGuildGateway {
        &self.gateway
    }

    pub fn policy(&self) -> &ModerationPolicyFile {
        &self.policy
    }

    pub fn reaction_rules(&self) -> Vec<ReactionRule> {
        self.matcher.list_rules()
    }

    pub fn pending_grants(&self) -> Vec<GrantReceipt> {
        self.grants.pending()
    }

    pub fn is_muted(&self, user_id: &str) -> bool {
        self.coordinator.is_muted(user_id)
    }

    pub async fn run_once_fixture(
        &mut self,
        fixture: &GuildContractFixture,
    ) -> Result<ModerationRunSummary> {
        let mut summary = ModerationRunSummary {
            discovered_events: fixture.events.len(),
            ..ModerationRunSummary::default()
        };

        let mut queued = fixture.events.clone();
        queued.sort_by(|left, right| {
            left.timestamp_ms
                .cmp(&right.timestamp_ms)
                .then_with(|| event_dedupe_key(left).cmp(&event_dedupe_key(right)))
        });
        queued.truncate(self.config.queue_limit);
        summary.queued_events = queued.len();

        for event in &queued {
            let event_key = event_dedupe_key(event);
            if self.state.contains(&event_key) {
                summary.duplicate_skips = summary.duplicate_skips.saturating_add(1);
                continue;
            }

            let report = self.process_event(event).await;
            self.state.mark_processed(&event_key);
            self.event_log.append(&EventJournalRecord {
                timestamp_unix_ms: current_unix_timestamp_ms(),
                event_key,
                event_kind: event.event_kind.as_str().to_string(),
                channel_id: event.channel_id.clone(),
                actor_id: event.actor_id.clone(),
                action: report.action.clone(),
                status: report.status.to_string(),
                reason_code: report.reason_code.clone(),
                reactions_applied: report.reactions_applied,
                reaction_failures: report.reaction_failures,
            })?;
            fold_report(&mut summary, &report);
        }

        let counters = self.state.counters_mut();
        counters.events_completed = counters
            .events_completed
            .saturating_add(summary.completed_events);
        counters.duplicate_skips = counters
            .duplicate_skips
            .saturating_add(summary.duplicate_skips);
        counters.commands_executed = counters
            .commands_executed
            .saturating_add(summary.commands_executed);
        counters.commands_denied = counters
            .commands_denied
            .saturating_add(summary.commands_denied);
        counters.reactions_applied = counters
            .reactions_applied
            .saturating_add(summary.reactions_applied);
        counters.mutes_applied = counters.mutes_applied.saturating_add(summary.mutes_applied);
        counters.unmutes_applied = counters
            .unmutes_applied
            .saturating_add(summary.unmutes_applied);
        counters.grants_scheduled = counters
            .grants_scheduled
            .saturating_add(summary.grants_scheduled);
        self.state.save()?;
        Ok(summary)
    }

    async fn process_event(&self, event: &GuildInboundEvent) -> EventReport {
        // Bot-authored events never trigger commands or reactions; this is
        // what keeps the agent from reacting to its own replies.
        if event.actor_is_bot {
            return EventReport {
                action: "none".to_string(),
                status: STATUS_SKIPPED,
                reason_code: "skipped_bot_actor".to_string(),
                reactions_applied: 0,
                reaction_failures: 0,
                reply_sent: false,
            };
        }

        let mut reactions_applied = 0usize;
        let mut reaction_failures = 0usize;
        if event.event_kind == GuildEventKind::Message
            && self.policy.is_command_channel(&event.channel_id)
        {
            for symbol in self.matcher.evaluate(&event.text) {
                match self
                    .gateway
                    .react(&event.channel_id, &event.event_id, &symbol)
                    .await
                {
                    Ok(()) => reactions_applied = reactions_applied.saturating_add(1),
                    Err(error) => {
                        warn!(
                            event_id = %event.event_id,
                            symbol = %symbol,
                            error = %error,
                            "reaction apply failed"
                        );
                        reaction_failures = reaction_failures.saturating_add(1);
                    }
                }
            }
        }

        let command = match event.event_kind {
            GuildEventKind::Command => event.command.as_ref().map(resolve_command_invocation),
            GuildEventKind::Message => {
                if self.policy.is_command_channel(&event.channel_id) {
                    parse_prefix_command(&event.text)
                } else {
                    None
                }
            }
        };
        let Some(command) = command else {
            return EventReport {
                action: "message".to_string(),
                status: STATUS_NO_ACTION,
                reason_code: "message_scanned".to_string(),
                reactions_applied,
                reaction_failures,
                reply_sent: false,
            };
        };

        let command_name = command.name();
        let execution = match command {
            GuildCommand::Invalid { message } => {
                CommandExecution::invalid(command_name, "invalid_command", message)
            }
            other => self.execute_command(event, other).await,
        };
        let reply_sent = self.send_reply(event, &execution).await;
        EventReport {
            action: execution.command_name.to_string(),
            status: execution.status,
            reason_code: execution.reason_code,
            reactions_applied,
            reaction_failures,
            reply_sent,
        }
    }

    async fn execute_command(
        &self,
        event: &GuildInboundEvent,
        command: GuildCommand,
    ) -> CommandExecution {
        match command {
            GuildCommand::ReactionList => self.handle_reaction_list(),
            GuildCommand::ReactionSet { trigger, symbol } => {
                self.handle_reaction_set(event, &trigger, &symbol)
            }
            GuildCommand::Mute { target_user_id } => {
                self.handle_mute(event, &target_user_id).await
            }
            GuildCommand::Unmute { target_user_id } => {
                self.handle_unmute(event, &target_user_id).await
            }
            GuildCommand::EventOpen => self.handle_event_toggle(event, true).await,
            GuildCommand::EventClose => self.handle_event_toggle(event, false).await,
            GuildCommand::Restrict { target_user_id } => {
                self.handle_restrict(event, &target_user_id).await
            }
            GuildCommand::GrantRole { target_user_id } => {
                self.handle_grant(event, &target_user_id).await
            }
            GuildCommand::Invalid { message } => {
                CommandExecution::invalid("invalid", "invalid_command", message)
            }
        }
    }

    fn handle_reaction_list(&self) -> CommandExecution {
        let rules = self.matcher.list_rules();
        if rules.is_empty() {
            return CommandExecution::succeeded(
                COMMAND_REACTIONS,
                "reactions_listed",
                "No reaction rules are configured.".to_string(),
            );
        }
        let mut lines = vec!["Configured reaction rules:".to_string()];
        for rule in &rules {
            lines.push(format!("- `{}` reacts with {}", rule.trigger, rule.symbol));
        }
        CommandExecution::succeeded(COMMAND_REACTIONS, "reactions_listed", lines.join("\n"))
    }

    fn handle_reaction_set(
        &self,
        event: &GuildInboundEvent,
        trigger: &str,
        symbol: &str,
    ) -> CommandExecution {
        match self.matcher.set_rule(trigger, symbol, &event.actor_role_ids) {
            Ok(outcome) if outcome.created => CommandExecution::succeeded(
                COMMAND_REACTIONS_SET,
                "reaction_rule_created",
                format!(
                    "Added reaction rule `{}` reacting with {}.",
                    outcome.trigger, outcome.symbol
                ),
            ),
            Ok(outcome) => CommandExecution::succeeded(
                COMMAND_REACTIONS_SET,
                "reaction_rule_updated",
                format!(
                    "Updated reaction rule `{}` to react with {}.",
                    outcome.trigger, outcome.symbol
                ),
            ),
            Err(ReactionCommandError::PermissionDenied { reason_code }) => {
                CommandExecution::denied(
                    COMMAND_REACTIONS_SET,
                    &reason_code,
                    "You need the staff role to change reaction rules.".to_string(),
                )
            }
            Err(ReactionCommandError::InvalidRule { detail }) => CommandExecution::invalid(
                COMMAND_REACTIONS_SET,
                "invalid_rule",
                format!("Invalid reaction rule: {detail}."),
            ),
            Err(ReactionCommandError::Store { detail }) => CommandExecution::failed(
                COMMAND_REACTIONS_SET,
                "store_error",
                format!("Reaction rule update failed: {detail}"),
            ),
        }
    }

    async fn handle_mute(
        &self,
        event: &GuildInboundEvent,
        target_user_id: &str,
    ) -> CommandExecution {
        let target = match self.gateway.fetch_member(target_user_id).await {
            Ok(member) => member,
            Err(GatewayError::UnknownMember(user_id)) => {
                return CommandExecution::not_found(
                    COMMAND_MUTE,
                    "member_not_found",
                    format!("Member `{user_id}` was not found."),
                )
            }
            Err(error) => {
                return CommandExecution::failed(
                    COMMAND_MUTE,
                    "gateway_error",
                    format!("Mute failed: {error}."),
                )
            }
        };
        let agent = match self.gateway.fetch_agent().await {
            Ok(agent) => agent,
            Err(error) => {
                return CommandExecution::failed(
                    COMMAND_MUTE,
                    "agent_unresolved",
                    format!("Mute failed: {error}."),
                )
            }
        };

        let request = MuteRequest {
            target_user_id: target.user_id.clone(),
            target_role_ids: target.role_ids.clone(),
            requester_role_ids: event.actor_role_ids.clone(),
            agent_rank: agent.top_role_rank,
            target_rank: target.top_role_rank,
        };
        match self
            .coordinator
            .mute(self.gateway.as_ref(), &request)
            .await
        {
            Ok(outcome) => CommandExecution::succeeded(
                COMMAND_MUTE,
                "mute_applied",
                format!(
                    "Muted `{}`; snapshotted {} roles.",
                    display_label(&target),
                    outcome.snapshot_role_ids.len()
                ),
            ),
            Err(error) => map_moderation_error(COMMAND_MUTE, "Mute", error),
        }
    }

    async fn handle_unmute(
        &self,
        event: &GuildInboundEvent,
        target_user_id: &str,
    ) -> CommandExecution {
        let request = UnmuteRequest {
            target_user_id: target_user_id.to_string(),
            requester_role_ids: event.actor_role_ids.clone(),
        };
        match self
            .coordinator
            .unmute(self.gateway.as_ref(), &request)
            .await
        {
            Ok(outcome) if outcome.had_snapshot => CommandExecution::succeeded(
                COMMAND_UNMUTE,
                "unmute_applied",
                format!(
                    "Unmuted `{target_user_id}`; restored {} roles.",
                    outcome.restored_role_ids.len()
                ),
            ),
            Ok(_) => CommandExecution::succeeded(
                COMMAND_UNMUTE,
                "unmute_no_snapshot",
                format!("Unmuted `{target_user_id}`; no snapshot was stored."),
            ),
            Err(error) => map_moderation_error(COMMAND_UNMUTE, "Unmute", error),
        }
    }

    async fn handle_event_toggle(
        &self,
        event: &GuildInboundEvent,
        everyone_can_view: bool,
    ) -> CommandExecution {
        let command_name = if everyone_can_view {
            COMMAND_EVENT_OPEN
        } else {
            COMMAND_EVENT_CLOSE
        };
        let gate = evaluate_toggle_gate(&self.policy, &event.actor_role_ids);
        if !gate.is_allowed() {
            return CommandExecution::denied(
                command_name,
                gate.reason_code(),
                "You lack a role allowed to toggle event channels.".to_string(),
            );
        }
        if !self.allowlist.contains(&event.channel_id) {
            return CommandExecution::denied(
                command_name,
                "deny_channel_not_allowed",
                "This channel is not in the event channel list.".to_string(),
            );
        }
        match self
            .gateway
            .set_channel_visibility(&event.channel_id, everyone_can_view)
            .await
        {
            Ok(()) if everyone_can_view => CommandExecution::succeeded(
                command_name,
                "event_opened",
                "Event opened: everyone can view this channel.".to_string(),
            ),
            Ok(()) => CommandExecution::succeeded(
                command_name,
                "event_closed",
                "Event closed: the channel is hidden again.".to_string(),
            ),
            Err(GatewayError::UnknownChannel(channel_id)) => CommandExecution::not_found(
                command_name,
                "channel_not_found",
                format!("Channel `{channel_id}` was not found."),
            ),
            Err(error) => CommandExecution::failed(
                command_name,
                "gateway_error",
                format!("Event toggle failed: {error}."),
            ),
        }
    }

    async fn handle_restrict(
        &self,
        event: &GuildInboundEvent,
        target_user_id: &str,
    ) -> CommandExecution {
        let gate = evaluate_staff_gate(&self.policy, &event.actor_role_ids);
        if !gate.is_allowed() {
            return CommandExecution::denied(
                COMMAND_RESTRICT,
                gate.reason_code(),
                "You need the staff role to run this command.".to_string(),
            );
        }
        let target = match self.gateway.fetch_member(target_user_id).await {
            Ok(member) => member,
            Err(GatewayError::UnknownMember(user_id)) => {
                return CommandExecution::not_found(
                    COMMAND_RESTRICT,
                    "member_not_found",
                    format!("Member `{user_id}` was not found."),
                )
            }
            Err(error) => {
                return CommandExecution::failed(
                    COMMAND_RESTRICT,
                    "gateway_error",
                    format!("Restrict failed: {error}."),
                )
            }
        };

        let mut hidden_channels = 0usize;
        for channel_id in &self.policy.restricted_channel_ids {
            match self
                .gateway
                .set_member_channel_visibility(channel_id, &target.user_id, false)
                .await
            {
                Ok(()) => hidden_channels = hidden_channels.saturating_add(1),
                Err(error) => warn!(
                    channel_id = %channel_id,
                    user_id = %target.user_id,
                    error = %error,
                    "restrict overwrite failed"
                ),
            }
        }
        CommandExecution::succeeded(
            COMMAND_RESTRICT,
            "restrict_applied",
            format!(
                "Restricted `{}` across {hidden_channels} channels.",
                display_label(&target)
            ),
        )
    }

    async fn handle_grant(
        &self,
        event: &GuildInboundEvent,
        target_user_id: &str,
    ) -> CommandExecution {
        match self.grants.grant(target_user_id, &event.actor_role_ids).await {
            Ok(receipt) => CommandExecution::succeeded(
                COMMAND_GRANT_ROLE,
                "grant_scheduled",
                format!("Granted `{}` to `{target_user_id}`.", receipt.role_id),
            ),
            Err(GrantError::PermissionDenied { reason_code }) => CommandExecution::denied(
                COMMAND_GRANT_ROLE,
                &reason_code,
                "You lack a role allowed to grant the temporary role.".to_string(),
            ),
            Err(GrantError::Gateway(GatewayError::UnknownMember(user_id))) => {
                CommandExecution::not_found(
                    COMMAND_GRANT_ROLE,
                    "member_not_found",
                    format!("Member `{user_id}` was not found."),
                )
            }
            Err(GrantError::Gateway(error)) => CommandExecution::failed(
                COMMAND_GRANT_ROLE,
                "gateway_error",
                format!("Grant failed: {error}."),
            ),
        }
    }

    async fn send_reply(&self, event: &GuildInboundEvent, execution: &CommandExecution) -> bool {
        if execution.response_text.is_empty() {
            return false;
        }
        match self
            .gateway
            .reply(
                &event.channel_id,
                &event.event_id,
                &execution.response_text,
                execution.reply_private,
            )
            .await
        {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    event_id = %event.event_id,
                    error = %error,
                    "reply delivery failed"
                );
                false
            }
        }
    }
}

fn display_label(member: &GuildMember) -> String {
    if member.display_name.trim().is_empty() {
        member.user_id.clone()
    } else {
        member.display_name.clone()
    }
}

fn map_moderation_error(
    command_name: &'static str,
    verb: &str,
    error: ModerationError,
) -> CommandExecution {
    match error {
        ModerationError::PermissionDenied { reason_code } => CommandExecution::denied(
            command_name,
            &reason_code,
            "You need the staff role to run this command.".to_string(),
        ),
        ModerationError::RankTooLow {
            agent_rank,
            target_rank,
        } => CommandExecution::denied(
            command_name,
            ACCESS_REASON_DENY_AGENT_RANK,
            format!(
                "{verb} refused: agent rank {agent_rank} does not exceed target rank {target_rank}."
            ),
        ),
        ModerationError::AlreadyMuted { user_id } => CommandExecution::denied(
            command_name,
            "already_muted",
            format!("Member `{user_id}` is already muted."),
        ),
        ModerationError::AlreadyInProgress { user_id } => CommandExecution::denied(
            command_name,
            "transition_in_progress",
            format!("Another mute or unmute for `{user_id}` is still running."),
        ),
        ModerationError::Store { detail } => CommandExecution::failed(
            command_name,
            "store_error",
            format!("{verb} failed: {detail}"),
        ),
        ModerationError::Gateway(GatewayError::UnknownMember(user_id)) => {
            CommandExecution::not_found(
                command_name,
                "member_not_found",
                format!("Member `{user_id}` was not found."),
            )
        }
        ModerationError::Gateway(error) => CommandExecution::failed(
            command_name,
            "gateway_error",
            format!("{verb} failed: {error}."),
        ),
    }
}

fn fold_report(summary: &mut ModerationRunSummary, report: &EventReport) {
    summary.completed_events = summary.completed_events.saturating_add(1);
    summary.reactions_applied = summary
        .reactions_applied
        .saturating_add(report.reactions_applied);
    summary.reaction_failures = summary
        .reaction_failures
        .saturating_add(report.reaction_failures);
    if report.reply_sent {
        summary.replies_sent = summary.replies_sent.saturating_add(1);
    }
    match report.status {
        STATUS_SKIPPED => summary.bot_skips = summary.bot_skips.saturating_add(1),
        STATUS_OK => {
            summary.commands_executed = summary.commands_executed.saturating_add(1);
            match report.action.as_str() {
                COMMAND_MUTE => summary.mutes_applied = summary.mutes_applied.saturating_add(1),
                COMMAND_UNMUTE => {
                    summary.unmutes_applied = summary.unmutes_applied.saturating_add(1)
                }
                COMMAND_GRANT_ROLE => {
                    summary.grants_scheduled = summary.grants_scheduled.saturating_add(1)
                }
                _ => {}
            }
        }
        STATUS_DENIED => summary.commands_denied = summary.commands_denied.saturating_add(1),
        STATUS_INVALID => summary.commands_invalid = summary.commands_invalid.saturating_add(1),
        STATUS_NOT_FOUND => {
            summary.commands_not_found = summary.commands_not_found.saturating_add(1)
        }
        STATUS_FAILED => summary.commands_failed = summary.commands_failed.saturating_add(1),
        _ => {}
    }
}

/// Loads all inputs, replays the fixture, and prints the pass summary.
pub async fn run_moderation_contract_runner(config: ModerationRuntimeConfig) -> Result<()> {
    let fixture = load_guild_contract_fixture(&config.events_path)?;
    let mut runtime = ModerationRuntime::new(config)?;
    let summary = runtime.run_once_fixture(&fixture).await?;
    println!(
        "guild moderation summary: discovered={} queued={} completed={} duplicate_skips={} bot_skips={} commands={} denied={} invalid={} not_found={} failed={} reactions={} reaction_failures={} replies={} mutes={} unmutes={} grants={}",
        summary.discovered_events,
        summary.queued_events,
        summary.completed_events,
        summary.duplicate_skips,
        summary.bot_skips,
        summary.commands_executed,
        summary.commands_denied,
        summary.commands_invalid,
        summary.commands_not_found,
        summary.commands_failed,
        summary.reactions_applied,
        summary.reaction_failures,
        summary.replies_sent,
        summary.mutes_applied,
        summary.unmutes_applied,
        summary.grants_scheduled
    );
    Ok(())
}

/// Parses and validates the three input documents without executing events.
pub fn run_moderation_validation(
    events_path: &Path,
    guild_path: &Path,
    policy_path: &Path,
) -> Result<()> {
    let fixture = load_guild_contract_fixture(events_path)?;
    println!(
        "{}: OK ({} events)",
        events_path.display(),
        fixture.events.len()
    );
    let snapshot = load_guild_snapshot(guild_path)?;
    println!(
        "{}: OK ({} members, {} channels)",
        guild_path.display(),
        snapshot.members.len(),
        snapshot.channel_ids.len()
    );
    load_moderation_policy(policy_path)?;
    println!("{}: OK", policy_path.display());
    println!("command catalog:");
    for spec in GUILD_COMMAND_CATALOG {
        if spec.args.is_empty() {
            println!("  /{} - {}", spec.name, spec.description);
        } else {
            let args = spec
                .args
                .iter()
                .map(|arg| format!("<{arg}>"))
                .collect::<Vec<String>>()
                .join(" ");
            println!("  /{} {} - {}", spec.name, args, spec.description);
        }
    }
    Ok(())
}
