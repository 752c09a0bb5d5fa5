mod bootstrap_helpers;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use warden_runtime::{
    run_moderation_contract_runner, run_moderation_validation, ModerationRuntimeConfig,
};

use crate::bootstrap_helpers::init_tracing;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "warden",
    about = "Guild moderation agent driven by replayable event fixtures",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: WardenCommand,
}

#[derive(Debug, Subcommand)]
enum WardenCommand {
    /// Replay an event fixture through the moderation dispatcher.
    Run(RunArgs),
    /// Parse and validate the input documents without executing events.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(
        long,
        env = "WARDEN_EVENTS",
        value_name = "file",
        help = "Guild event fixture (JSON) to replay"
    )]
    events: PathBuf,

    #[arg(
        long,
        env = "WARDEN_GUILD",
        value_name = "file",
        help = "Guild snapshot seeding the simulated members and channels"
    )]
    guild: PathBuf,

    #[arg(
        long,
        env = "WARDEN_POLICY",
        value_name = "file",
        help = "Moderation policy document"
    )]
    policy: PathBuf,

    #[arg(
        long = "state-dir",
        env = "WARDEN_STATE_DIR",
        default_value = ".warden/state",
        value_name = "dir",
        help = "Directory holding the durable moderation documents and run state"
    )]
    state_dir: PathBuf,

    #[arg(
        long = "queue-limit",
        env = "WARDEN_QUEUE_LIMIT",
        default_value_t = 64,
        value_parser = parse_positive_usize,
        help = "Maximum inbound events processed per pass"
    )]
    queue_limit: usize,

    #[arg(
        long = "processed-event-cap",
        env = "WARDEN_PROCESSED_EVENT_CAP",
        default_value_t = 10_000,
        value_parser = parse_positive_usize,
        help = "Maximum processed-event keys retained for duplicate suppression"
    )]
    processed_event_cap: usize,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(
        long,
        env = "WARDEN_EVENTS",
        value_name = "file",
        help = "Guild event fixture (JSON) to validate"
    )]
    events: PathBuf,

    #[arg(
        long,
        env = "WARDEN_GUILD",
        value_name = "file",
        help = "Guild snapshot to validate"
    )]
    guild: PathBuf,

    #[arg(
        long,
        env = "WARDEN_POLICY",
        value_name = "file",
        help = "Moderation policy document to validate"
    )]
    policy: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        WardenCommand::Run(args) => {
            run_moderation_contract_runner(ModerationRuntimeConfig {
                events_path: args.events,
                guild_path: args.guild,
                policy_path: args.policy,
                state_dir: args.state_dir,
                queue_limit: args.queue_limit,
                processed_event_cap: args.processed_event_cap,
            })
            .await
        }
        WardenCommand::Validate(args) => {
            run_moderation_validation(&args.events, &args.guild, &args.policy)
        }
    }
}
