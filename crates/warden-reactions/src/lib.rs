//! Reaction rule ownership and trigger evaluation.

pub mod reaction_matcher;

pub use reaction_matcher::{ReactionCommandError, ReactionMatcher, SetRuleOutcome};
