use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use loadline_core::sessions::InMemorySessionStore;

/// Periodically drops sessions whose call never sent `call.ended`.
pub fn spawn(
    sessions: Arc<InMemorySessionStore>,
    idle_ttl: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_once(&sessions, idle_ttl).await;
        }
    })
}

pub async fn sweep_once(sessions: &InMemorySessionStore, idle_ttl: Duration) -> usize {
    let evicted = sessions.evict_idle(idle_ttl).await;
    if !evicted.is_empty() {
        info!(
            event_name = "sessions.idle_evicted",
            correlation_id = "sweeper",
            evicted = evicted.len(),
            "idle call sessions evicted"
        );
    }
    evicted.len()
}
