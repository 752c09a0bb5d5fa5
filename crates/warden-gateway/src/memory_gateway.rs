//! In-memory gateway used by the contract runner and tests.
//!
//! Seeded from a guild snapshot, it applies the same hierarchy rule the live
//! platform applies to role mutations and records every reply, reaction, and
//! overwrite in call order. Faults can be injected per member or per symbol
//! to exercise failure paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::gateway_contract::{GatewayError, GuildGateway, GuildMember};
use crate::guild_snapshot::GuildSnapshotFile;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Reply captured by the in-memory gateway.
pub struct RecordedReply {
    pub channel_id: String,
    pub event_id: String,
    pub text: String,
    pub private_to_invoker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Reaction captured by the in-memory gateway.
pub struct RecordedReaction {
    pub channel_id: String,
    pub message_id: String,
    pub symbol: String,
}

#[derive(Debug, Default)]
struct MemoryGuildState {
    members: BTreeMap<String, GuildMember>,
    channels: BTreeSet<String>,
    everyone_visibility: BTreeMap<String, bool>,
    member_visibility: BTreeMap<(String, String), bool>,
    replies: Vec<RecordedReply>,
    reactions: Vec<RecordedReaction>,
    add_role_faults: BTreeSet<String>,
    remove_role_faults: BTreeSet<String>,
    react_faults: BTreeSet<String>,
}

/// Simulated guild honoring the `GuildGateway` contract.
pub struct InMemoryGuildGateway {
    agent_user_id: String,
    state: Mutex<MemoryGuildState>,
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl InMemoryGuildGateway {
    /// Builds a gateway from a validated snapshot.
    pub fn from_snapshot(snapshot: &GuildSnapshotFile) -> Self {
        let mut state = MemoryGuildState::default();
        for member in &snapshot.members {
            state.members.insert(member.user_id.clone(), member.clone());
        }
        for channel_id in &snapshot.channel_ids {
            state.channels.insert(channel_id.clone());
        }
        Self {
            agent_user_id: snapshot.agent_user_id.clone(),
            state: Mutex::new(state),
        }
    }

    pub fn agent_user_id(&self) -> &str {
        &self.agent_user_id
    }

    pub fn member_role_ids(&self, user_id: &str) -> Option<Vec<String>> {
        let state = lock_unpoisoned(&self.state);
        state.members.get(user_id).map(|member| member.role_ids.clone())
    }

    pub fn replies(&self) -> Vec<RecordedReply> {
        lock_unpoisoned(&self.state).replies.clone()
    }

    pub fn reactions(&self) -> Vec<RecordedReaction> {
        lock_unpoisoned(&self.state).reactions.clone()
    }

    pub fn everyone_can_view(&self, channel_id: &str) -> Option<bool> {
        lock_unpoisoned(&self.state)
            .everyone_visibility
            .get(channel_id)
            .copied()
    }

    pub fn member_can_view(&self, channel_id: &str, user_id: &str) -> Option<bool> {
        lock_unpoisoned(&self.state)
            .member_visibility
            .get(&(channel_id.to_string(), user_id.to_string()))
            .copied()
    }

    /// Simulates a member leaving the guild.
    pub fn drop_member(&self, user_id: &str) {
        lock_unpoisoned(&self.state).members.remove(user_id);
    }

    /// Makes every subsequent `add_roles` for `user_id` fail until cleared.
    pub fn inject_add_role_fault(&self, user_id: &str) {
        lock_unpoisoned(&self.state)
            .add_role_faults
            .insert(user_id.to_string());
    }

    /// Makes every subsequent `remove_roles` for `user_id` fail until cleared.
    pub fn inject_remove_role_fault(&self, user_id: &str) {
        lock_unpoisoned(&self.state)
            .remove_role_faults
            .insert(user_id.to_string());
    }

    /// Makes every subsequent `react` with `symbol` fail until cleared.
    pub fn inject_react_fault(&self, symbol: &str) {
        lock_unpoisoned(&self.state)
            .react_faults
            .insert(symbol.to_string());
    }

    pub fn clear_faults(&self) {
        let mut state = lock_unpoisoned(&self.state);
        state.add_role_faults.clear();
        state.remove_role_faults.clear();
        state.react_faults.clear();
    }

    fn locked(&self) -> Result<MutexGuard<'_, MemoryGuildState>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Platform("gateway state lock is poisoned".to_string()))
    }

    fn hierarchy_allows(
        state: &MemoryGuildState,
        agent_user_id: &str,
        target: &GuildMember,
    ) -> bool {
        // Role edits on the agent itself bypass the hierarchy comparison.
        if target.user_id == agent_user_id {
            return true;
        }
        let Some(agent) = state.members.get(agent_user_id) else {
            return false;
        };
        agent.top_role_rank > target.top_role_rank
    }
}

#[async_trait]
impl GuildGateway for InMemoryGuildGateway {
    async fn fetch_member(&self, user_id: &str) -> Result<GuildMember, GatewayError> {
        let state = self.locked()?;
        state
            .members
            .get(user_id)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownMember(user_id.to_string()))
    }

    async fn fetch_agent(&self) -> Result<GuildMember, GatewayError> {
        self.fetch_member(&self.agent_user_id).await
    }

    async fn add_roles(&self, user_id: &str, role_ids: &[String]) -> Result<(), GatewayError> {
        let mut state = self.locked()?;
        if state.add_role_faults.contains(user_id) {
            return Err(GatewayError::Platform(format!(
                "injected add_roles fault for '{user_id}'"
            )));
        }
        let Some(target) = state.members.get(user_id).cloned() else {
            return Err(GatewayError::UnknownMember(user_id.to_string()));
        };
        if !Self::hierarchy_allows(&state, &self.agent_user_id, &target) {
            return Err(GatewayError::HierarchyRejected {
                user_id: user_id.to_string(),
            });
        }
        let member = state
            .members
            .get_mut(user_id)
            .ok_or_else(|| GatewayError::UnknownMember(user_id.to_string()))?;
        for role_id in role_ids {
            if !member.role_ids.iter().any(|held| held == role_id) {
                member.role_ids.push(role_id.clone());
            }
        }
        Ok(())
    }

    async fn remove_roles(&self, user_id: &str, role_ids: &[String]) -> Result<(), GatewayError> {
        let mut state = self.locked()?;
        if state.remove_role_faults.contains(user_id) {
            return Err(GatewayError::Platform(format!(
                "injected remove_roles fault for '{user_id}'"
            )));
        }
        let Some(target) = state.members.get(user_id).cloned() else {
            return Err(GatewayError::UnknownMember(user_id.to_string()));
        };
        if !Self::hierarchy_allows(&state, &self.agent_user_id, &target) {
            return Err(GatewayError::HierarchyRejected {
                user_id: user_id.to_string(),
            });
        }
        let member = state
            .members
            .get_mut(user_id)
            .ok_or_else(|| GatewayError::UnknownMember(user_id.to_string()))?;
        member
            .role_ids
            .retain(|held| !role_ids.iter().any(|removed| removed == held));
        Ok(())
    }

    async fn react(
        &self,
        channel_id: &str,
        message_id: &str,
        symbol: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.locked()?;
        if !state.channels.contains(channel_id) {
            return Err(GatewayError::UnknownChannel(channel_id.to_string()));
        }
        if symbol.trim().is_empty() {
            return Err(GatewayError::Platform(
                "reaction symbol must not be empty".to_string(),
            ));
        }
        if state.react_faults.contains(symbol) {
            return Err(GatewayError::Platform(format!(
                "injected react fault for '{symbol}'"
            )));
        }
        state.reactions.push(RecordedReaction {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            symbol: symbol.to_string(),
        });
        Ok(())
    }

    async fn reply(
        &self,
        channel_id: &str,
        event_id: &str,
        text: &str,
        private_to_invoker: bool,
    ) -> Result<(), GatewayError> {
        let mut state = self.locked()?;
        if !state.channels.contains(channel_id) {
            return Err(GatewayError::UnknownChannel(channel_id.to_string()));
        }
        state.replies.push(RecordedReply {
            channel_id: channel_id.to_string(),
            event_id: event_id.to_string(),
            text: text.to_string(),
            private_to_invoker,
        });
        Ok(())
    }

    async fn set_channel_visibility(
        &self,
        channel_id: &str,
        everyone_can_view: bool,
    ) -> Result<(), GatewayError> {
        let mut state = self.locked()?;
        if !state.channels.contains(channel_id) {
            return Err(GatewayError::UnknownChannel(channel_id.to_string()));
        }
        state
            .everyone_visibility
            .insert(channel_id.to_string(), everyone_can_view);
        Ok(())
    }

    async fn set_member_channel_visibility(
        &self,
        channel_id: &str,
        user_id: &str,
        can_view: bool,
    ) -> Result<(), GatewayError> {
        let mut state = self.locked()?;
        if !state.channels.contains(channel_id) {
            return Err(GatewayError::UnknownChannel(channel_id.to_string()));
        }
        if !state.members.contains_key(user_id) {
            return Err(GatewayError::UnknownMember(user_id.to_string()));
        }
        state
            .member_visibility
            .insert((channel_id.to_string(), user_id.to_string()), can_view);
        Ok(())
    }
}
