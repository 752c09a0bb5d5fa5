//! Platform gateway contract.
//!
//! Everything Warden needs from the chat platform sits behind this trait:
//! member lookup, batch role mutation, reactions, replies, and channel
//! permission overwrites. The live client and the in-memory gateway both
//! implement it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates `GuildGateway` failure modes.
pub enum GatewayError {
    #[error("unknown member '{0}'")]
    UnknownMember(String),
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),
    #[error("role hierarchy rejected mutation on member '{user_id}'")]
    HierarchyRejected { user_id: String },
    #[error("platform call failed: {0}")]
    Platform(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Guild membership record as the platform reports it.
pub struct GuildMember {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub role_ids: Vec<String>,
    /// Position of the member's highest role in the guild hierarchy.
    #[serde(default)]
    pub top_role_rank: i64,
    #[serde(default)]
    pub is_bot: bool,
}

impl GuildMember {
    pub fn has_role(&self, role_id: &str) -> bool {
        self.role_ids.iter().any(|held| held == role_id)
    }
}

#[async_trait]
/// Trait contract for platform-side guild operations.
pub trait GuildGateway: Send + Sync {
    async fn fetch_member(&self, user_id: &str) -> Result<GuildMember, GatewayError>;

    /// Membership record of the automation agent itself.
    async fn fetch_agent(&self) -> Result<GuildMember, GatewayError>;

    async fn add_roles(&self, user_id: &str, role_ids: &[String]) -> Result<(), GatewayError>;

    async fn remove_roles(&self, user_id: &str, role_ids: &[String]) -> Result<(), GatewayError>;

    async fn react(
        &self,
        channel_id: &str,
        message_id: &str,
        symbol: &str,
    ) -> Result<(), GatewayError>;

    async fn reply(
        &self,
        channel_id: &str,
        event_id: &str,
        text: &str,
        private_to_invoker: bool,
    ) -> Result<(), GatewayError>;

    /// Flips the guild-wide view overwrite on a channel.
    async fn set_channel_visibility(
        &self,
        channel_id: &str,
        everyone_can_view: bool,
    ) -> Result<(), GatewayError>;

    /// Flips a single member's view overwrite on a channel.
    async fn set_member_channel_visibility(
        &self,
        channel_id: &str,
        user_id: &str,
        can_view: bool,
    ) -> Result<(), GatewayError>;
}
