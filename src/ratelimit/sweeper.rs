// Background cleanup for the endpoint limiters.
//
// Checks prune lazily per identifier, but identifiers that never come back
// would otherwise stay in memory forever. The sweeper calls cleanup() on
// every limiter on a fixed tick for as long as the server runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::policy::EndpointLimits;

/// Shortest tick the sweeper will run at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the periodic cleanup task. The first sweep happens one full
/// `every` after start-up; `every` is raised to [`MIN_SWEEP_INTERVAL`].
pub fn spawn_sweeper(limits: Arc<EndpointLimits>, every: Duration) -> JoinHandle<()> {
    let every = every.max(MIN_SWEEP_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately on the first tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            for limiter in limits.all() {
                let removed = limiter.cleanup();
                if removed > 0 {
                    debug!(
                        endpoint = limiter.name(),
                        removed,
                        tracked = limiter.tracked_identifiers(),
                        "Swept idle rate limit identifiers"
                    );
                }
            }
        }
    })
}
