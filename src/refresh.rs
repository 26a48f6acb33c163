//! Periodic refresh of persisted rates from the provider.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::core::cache::{RATE_TTL, RateCache, record_cache_outcome};
use crate::core::context::CallContext;
use crate::core::error::RateError;
use crate::core::provider::RateProvider;
use crate::core::store::{CurrencyStore, StoreError};

pub struct RateRefresher {
    provider: Arc<dyn RateProvider>,
    store: Arc<dyn CurrencyStore>,
    cache: Arc<dyn RateCache>,
    interval: Duration,
}

impl RateRefresher {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn CurrencyStore>,
        cache: Arc<dyn RateCache>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            cache,
            interval,
        }
    }

    /// Pulls one snapshot and rewrites every stored currency it quotes.
    ///
    /// Codes the store does not know are skipped, and stored currencies the
    /// snapshot does not quote are left as they are. A store failure on one
    /// record is logged and the cycle moves on; only a provider failure or an
    /// interruption fails the cycle. Returns how many records were updated.
    #[instrument(skip(self, ctx))]
    pub async fn refresh_once(&self, ctx: &CallContext) -> Result<usize, RateError> {
        let snapshot = ctx.guard(self.provider.fetch_snapshot()).await??;

        let mut updated = 0;
        for (code, rate) in &snapshot.rates {
            let mut currency = match ctx.guard(self.store.get_by_code(code)).await? {
                Ok(Some(currency)) => currency,
                Ok(None) => continue,
                Err(e) => {
                    warn!(code = %code, error = %e, "Skipping currency, store read failed");
                    continue;
                }
            };

            currency.revise(*rate, None);
            match ctx.guard(self.store.update(&currency)).await? {
                Ok(()) => updated += 1,
                // removed since it was read
                Err(StoreError::NotFound(_)) => {
                    debug!(code = %code, "Currency removed during refresh");
                    continue;
                }
                Err(e) => {
                    warn!(code = %code, error = %e, "Skipping currency, store update failed");
                    continue;
                }
            }

            let outcome = ctx.guard(self.cache.set(code, *rate, RATE_TTL)).await;
            record_cache_outcome("set", code, outcome);
        }

        debug!(quoted = snapshot.len(), updated, "Refresh cycle done");
        Ok(updated)
    }

    /// Refreshes every `interval` until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        if self.interval.is_zero() {
            info!("Rate refresh disabled");
            return;
        }
        info!(interval_secs = self.interval.as_secs(), "Rate refresher started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Rate refresher received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    let ctx = CallContext::with_token(shutdown.child_token())
                        .with_timeout(self.interval);
                    match self.refresh_once(&ctx).await {
                        Ok(updated) => info!(updated, "Refreshed stored rates"),
                        Err(e) => error!(error = %e, kind = ?e.kind(), "Rate refresh failed"),
                    }
                }
            }
        }
    }
}
