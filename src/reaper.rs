use crate::store::RoundStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Spawn a background task that drops rounds once they are `grace` past expiry.
///
/// Rounds orphaned by abandoned create requests are reclaimed here. The grace
/// period keeps consumed rounds around long enough for retried submissions
/// to receive their cached verdict.
pub fn spawn_round_reaper(
    store: Arc<dyn RoundStore>,
    every: Duration,
    grace: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            reap_once(store.as_ref(), grace).await;
        }
    })
}

/// Run a single purge pass, returning how many rounds were dropped
pub async fn reap_once(store: &dyn RoundStore, grace: Duration) -> usize {
    // A grace beyond the calendar keeps everything
    let cutoff = chrono::Duration::from_std(grace)
        .ok()
        .and_then(|grace| Utc::now().checked_sub_signed(grace))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    match store.purge_expired(cutoff).await {
        Ok(0) => 0,
        Ok(purged) => {
            tracing::info!(purged, "Reaped expired rounds");
            purged
        }
        Err(e) => {
            tracing::warn!("Round reaper failed: {}", e);
            0
        }
    }
}
