//! Background revocation loader.
//!
//! Polls the configured source on a fixed interval and atomically republishes
//! the cache on every successful fetch. A failed fetch or timeout leaves the
//! previously published set in place and is retried on the next tick
//! indefinitely; nothing is ever published from a partial fetch. The loop
//! exits promptly when the shutdown token is cancelled.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::RevocationCache;
use super::source::{parse_revocation_blob, RevocationSource};

pub struct RevocationLoader {
    cache: Arc<RevocationCache>,
    source: Arc<dyn RevocationSource>,
    poll_interval: Duration,
    fetch_timeout: Duration,
}

impl RevocationLoader {
    pub fn new(
        cache: Arc<RevocationCache>,
        source: Arc<dyn RevocationSource>,
        poll_interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            poll_interval,
            fetch_timeout,
        }
    }

    /// Run the polling loop until `shutdown` is cancelled. The first tick
    /// fires immediately, so the cache is populated at startup without
    /// waiting a full interval.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            source = %self.source.describe(),
            interval_secs = self.poll_interval.as_secs(),
            "Starting revocation loader"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Revocation loader stopping");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.refresh_once().await {
                warn!(
                    error = %e,
                    generation = self.cache.generation(),
                    "Revocation refresh failed, retaining last known-good set"
                );
            }
        }
    }

    /// Fetch, parse and publish one refresh. Parse-then-swap: the cache is
    /// only touched after the whole blob has been fetched and parsed.
    pub async fn refresh_once(&self) -> Result<()> {
        let blob = tokio::time::timeout(self.fetch_timeout, self.source.fetch())
            .await
            .map_err(|_| {
                anyhow!(
                    "revocation fetch timed out after {}s",
                    self.fetch_timeout.as_secs()
                )
            })??;

        let hashes = parse_revocation_blob(&blob);
        let entries = hashes.len();
        let generation = self.cache.replace(hashes);
        debug!(generation, entries, "Revocation set replaced");
        Ok(())
    }
}
