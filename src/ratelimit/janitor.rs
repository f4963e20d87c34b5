//! Background eviction of stale rate limit state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::limiter::RateLimiter;

/// Handle to the periodic sweep task.
///
/// The task runs until [`Janitor::stop`] is awaited or the handle is dropped.
pub struct Janitor {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Janitor {
    /// Spawn the sweep task on the current tokio runtime.
    ///
    /// `period` must be non-zero.
    pub fn start(limiter: Arc<RateLimiter>, period: Duration) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        info!(period = ?period, "Starting rate limit janitor");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = limiter.sweep();
                        debug!(
                            global_retained = report.global.retained,
                            global_evicted = report.global.evicted,
                            write_path_retained = report.write_path.retained,
                            write_path_evicted = report.write_path.evicted,
                            "Rate limit sweep complete"
                        );
                    }
                    _ = cancelled.cancelled() => {
                        debug!("Rate limit janitor cancelled");
                        break;
                    }
                }
            }
        });

        Self {
            token,
            task: Some(task),
        }
    }

    /// Whether the sweep task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the sweep task and wait for it to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Rate limit janitor exited abnormally");
            }
        }
        info!("Rate limit janitor stopped");
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
