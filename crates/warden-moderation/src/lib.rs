//! Mute lifecycle coordination for guild moderation.

mod mute_coordinator;

pub use mute_coordinator::{
    ModerationError, MuteCoordinator, MuteOutcome, MuteRequest, UnmuteOutcome, UnmuteRequest,
};
