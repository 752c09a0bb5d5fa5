//! Foundational low-level utilities shared across Warden crates.
//!
//! Provides the atomic document-write helper and the Unix-time helpers used by
//! state persistence and grant-expiry bookkeeping.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms, is_expired_unix_ms};
