//! Platform gateway boundary: the trait contract, the guild snapshot document,
//! and the in-memory implementation used by the contract runner and tests.

pub mod gateway_contract;
pub mod guild_snapshot;
pub mod memory_gateway;

pub use gateway_contract::{GatewayError, GuildGateway, GuildMember};
pub use guild_snapshot::{
    load_guild_snapshot, parse_guild_snapshot, validate_guild_snapshot, GuildSnapshotFile,
    GUILD_SNAPSHOT_SCHEMA_VERSION,
};
pub use memory_gateway::{InMemoryGuildGateway, RecordedReaction, RecordedReply};
