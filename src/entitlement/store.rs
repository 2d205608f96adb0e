//! In-memory entitlement state.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

/// Telegram user identifier.
pub type UserId = u64;

/// Single source of truth for "may this user fetch listings right now".
///
/// Holds at most one expiry instant per user. A missing entry means the
/// user was never granted access; an entry in the past means the access
/// ran out and is waiting for the reaper.
#[derive(Debug, Default)]
pub struct EntitlementStore {
    entries: RwLock<HashMap<UserId, DateTime<Utc>>>,
}

impl EntitlementStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the user has an entry that expires after `now`.
    pub async fn is_entitled(&self, user: UserId, now: DateTime<Utc>) -> bool {
        self.entries
            .read()
            .await
            .get(&user)
            .is_some_and(|expires_at| now < *expires_at)
    }

    /// Sets the user's expiry to `now + trial`, replacing any previous entry.
    pub async fn grant_trial(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        trial: Duration,
    ) -> DateTime<Utc> {
        let expires_at = now + trial;
        self.entries.write().await.insert(user, expires_at);
        debug!("Granted user {} access until {}", user, expires_at);
        expires_at
    }

    /// Returns the stored expiry for the user, expired or not.
    pub async fn expires_at(&self, user: UserId) -> Option<DateTime<Utc>> {
        self.entries.read().await.get(&user).copied()
    }

    /// Returns every user whose expiry lies strictly before `now`.
    pub async fn expired_user_ids(&self, now: DateTime<Utc>) -> HashSet<UserId> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(_, expires_at)| **expires_at < now)
            .map(|(user, _)| *user)
            .collect()
    }

    /// Removes the user's entry. Returns whether one existed.
    pub async fn evict(&self, user: UserId) -> bool {
        self.entries.write().await.remove(&user).is_some()
    }

    /// Removes every entry that expired before `now` under a single write guard.
    ///
    /// Entries granted or extended after a scan are re-checked here, so a
    /// record with `expires_at >= now` is never removed.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at >= now);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
