//! Periodic catalog refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::catalog::AwsNexradDataProvider;

/// Refreshes one catalog on a fixed interval until shut down.
pub struct RefreshScheduler {
    provider: Arc<AwsNexradDataProvider>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(provider: Arc<AwsNexradDataProvider>, interval: Duration) -> Self {
        Self { provider, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one refresh and log what it found.
    pub async fn run_once(&self) -> (usize, usize) {
        let (new, total) = self.provider.refresh().await;
        if new > 0 {
            let latest = self.provider.find_latest_key().await;
            info!(
                site = %self.provider.site(),
                new,
                total,
                latest = ?latest,
                "Catalog updated"
            );
        } else {
            debug!(site = %self.provider.site(), total, "No new objects");
        }
        (new, total)
    }

    /// Refresh until a shutdown signal arrives.
    ///
    /// Listing failures are logged by the catalog and retried on the next tick.
    pub async fn run_forever(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            site = %self.provider.site(),
            interval_secs = self.interval.as_secs(),
            "Starting refresh scheduler"
        );

        loop {
            self.run_once().await;

            tokio::select! {
                _ = shutdown.recv() => {
                    info!(site = %self.provider.site(), "Shutting down refresh scheduler");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
