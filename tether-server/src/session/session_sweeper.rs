use crate::session::session_registry::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

/// Periodically drop stale sessions until the returned handle is aborted.
pub fn spawn_sweeper(
    sessions: Arc<SessionRegistry>,
    every: Duration,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = sessions.sweep(ttl);
            debug!("Sweep removed {} sessions, {} live", removed, sessions.len());
        }
    })
}
