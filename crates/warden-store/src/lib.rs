//! Durable document repositories for Warden state.
//!
//! Three whole-document JSON stores (mute snapshots, reaction rules, allowed
//! channels) with an explicit load/flush lifecycle over atomic writes.

pub mod channel_allowlist;
pub mod document_io;
pub mod mute_ledger;
pub mod reaction_book;

pub use channel_allowlist::{
    channel_allowlist_path, ChannelAllowlist, CHANNEL_ALLOWLIST_SCHEMA_VERSION,
};
pub use document_io::{load_json_document, save_json_document};
pub use mute_ledger::{mute_ledger_path, MuteLedger, MUTE_LEDGER_SCHEMA_VERSION};
pub use reaction_book::{
    reaction_book_path, ReactionBook, ReactionRule, REACTION_BOOK_SCHEMA_VERSION,
};
