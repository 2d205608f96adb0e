//! Entitlement tracking module.
//!
//! Records one access expiry per user and evicts stale entries
//! in the background.

mod reaper;
mod store;

pub use reaper::{ExpiryReaper, ReaperMessage};
pub use store::{EntitlementStore, UserId};
