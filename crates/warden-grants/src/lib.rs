//! Temporary role grants with deferred expiry.

mod grant_scheduler;

pub use grant_scheduler::{GrantError, GrantReceipt, GrantScheduler};
