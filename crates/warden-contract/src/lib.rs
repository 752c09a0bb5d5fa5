//! Guild event contract, fixture parsing, and tagged command resolution.

pub mod guild_command;
pub mod guild_contract;

pub use guild_command::{
    parse_prefix_command, resolve_command_invocation, GuildCommand, GuildCommandSpec,
    COMMAND_EVENT_CLOSE, COMMAND_EVENT_OPEN, COMMAND_GRANT_ROLE, COMMAND_MUTE, COMMAND_REACTIONS,
    COMMAND_REACTIONS_SET, COMMAND_RESTRICT, COMMAND_UNMUTE, GUILD_COMMAND_CATALOG,
};
pub use guild_contract::{
    event_dedupe_key, load_guild_contract_fixture, parse_guild_contract_fixture,
    validate_guild_contract_fixture, validate_guild_inbound_event, GuildCommandInvocation,
    GuildContractFixture, GuildEventKind, GuildInboundEvent, GUILD_CONTRACT_SCHEMA_VERSION,
};
