//! Periodic maintenance of the throttle state, off the request path.

use super::RequestThrottle;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Sweep `throttle` every `every`, keeping timestamps younger than `retention`.
///
/// The task runs until the handle is aborted or the runtime shuts down.
pub fn spawn_sweeper(
    throttle: Arc<RequestThrottle>,
    every: Duration,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一次 tick 立即完成，跳过
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let report = throttle.sweep(retention);
            if report.removed_clients > 0 {
                info!(
                    pruned = report.pruned_timestamps,
                    removed = report.removed_clients,
                    remaining = report.remaining_clients,
                    "throttle sweep completed"
                );
            } else {
                debug!(
                    pruned = report.pruned_timestamps,
                    remaining = report.remaining_clients,
                    "throttle sweep completed"
                );
            }
        }
    })
}
