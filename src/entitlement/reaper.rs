//! Background eviction of expired entitlements.
//!
//! The reaper only keeps the store from growing; correctness of the
//! entitlement check never depends on it having run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info};

use super::EntitlementStore;

/// Messages that can be sent to the reaper.
#[derive(Debug, Clone)]
pub enum ReaperMessage {
    /// Run a sweep right away.
    Sweep,
    /// Stop the reaper.
    Shutdown,
}

/// Periodically evicts entries whose expiry has passed.
pub struct ExpiryReaper {
    store: Arc<EntitlementStore>,
    sweep_interval: Duration,
}

impl ExpiryReaper {
    /// Creates a new reaper that sweeps every `sweep_interval`.
    #[must_use]
    pub const fn new(store: Arc<EntitlementStore>, sweep_interval: Duration) -> Self {
        Self {
            store,
            sweep_interval,
        }
    }

    /// Runs the sweep loop until [`ReaperMessage::Shutdown`] arrives or the
    /// sender is dropped.
    pub async fn run(&self, mut rx: mpsc::Receiver<ReaperMessage>) {
        info!(
            "Expiry reaper started (interval: {}s)",
            self.sweep_interval.as_secs()
        );

        let mut timer = interval(self.sweep_interval);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.sweep(Utc::now()).await;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(ReaperMessage::Sweep) => {
                            debug!("Received sweep message");
                            self.sweep(Utc::now()).await;
                        }
                        Some(ReaperMessage::Shutdown) | None => {
                            info!("Expiry reaper shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Evicts every entry that expired before `now`. Returns how many were removed.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let evicted = self.store.evict_expired(now).await;

        if evicted > 0 {
            info!(
                "Evicted {} expired entitlement(s), {} remaining",
                evicted,
                self.store.len().await
            );
        } else {
            debug!("No expired entitlements");
        }

        evicted
    }
}

impl std::fmt::Debug for ExpiryReaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiryReaper")
            .field("sweep_interval", &self.sweep_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let store = Arc::new(EntitlementStore::new());
        store.grant_trial(1, t0(), chrono::Duration::hours(1)).await;
        store.grant_trial(2, t0(), chrono::Duration::hours(2)).await;
        store.grant_trial(3, t0(), chrono::Duration::days(2)).await;

        let reaper = ExpiryReaper::new(Arc::clone(&store), Duration::from_secs(3600));
        let now = t0() + chrono::Duration::hours(2);
        let evicted = reaper.sweep(now).await;

        assert_eq!(evicted, 1);
        assert!(store.expires_at(1).await.is_none());
        // Expires exactly at `now`: left alone.
        assert_eq!(
            store.expires_at(2).await,
            Some(t0() + chrono::Duration::hours(2))
        );
        assert!(store.is_entitled(3, now).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_grant_during_sweep_survives() {
        const USERS: u64 = 2000;

        let store = Arc::new(EntitlementStore::new());
        for user in 0..USERS {
            store.grant_trial(user, t0(), chrono::Duration::hours(1)).await;
        }

        let now = t0() + chrono::Duration::days(1);
        let reaper = ExpiryReaper::new(Arc::clone(&store), Duration::from_secs(3600));
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let sweep = {
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                reaper.sweep(now).await
            })
        };
        let regrant = {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                for user in 0..USERS {
                    if !store.is_entitled(user, now).await {
                        store.grant_trial(user, now, chrono::Duration::days(2)).await;
                    }
                }
            })
        };

        sweep.await.unwrap();
        regrant.await.unwrap();

        for user in 0..USERS {
            assert!(
                store.is_entitled(user, now).await,
                "user {user} lost a trial granted during the sweep"
            );
        }
        assert_eq!(store.len().await, usize::try_from(USERS).unwrap());
    }

    #[tokio::test]
    async fn test_sweep_empty_store() {
        let store = Arc::new(EntitlementStore::new());
        let reaper = ExpiryReaper::new(store, Duration::from_secs(3600));
        assert_eq!(reaper.sweep(t0()).await, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(EntitlementStore::new());
        let past = Utc::now() - chrono::Duration::days(3);
        store.grant_trial(9, past, chrono::Duration::days(2)).await;

        let reaper = ExpiryReaper::new(Arc::clone(&store), Duration::from_secs(3600));
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(async move { reaper.run(rx).await });

        tx.send(ReaperMessage::Sweep).await.unwrap();
        tx.send(ReaperMessage::Shutdown).await.unwrap();
        handle.await.unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_dropped() {
        let store = Arc::new(EntitlementStore::new());
        let reaper = ExpiryReaper::new(store, Duration::from_secs(3600));
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move { reaper.run(rx).await });

        drop(tx);
        handle.await.unwrap();
    }
}
