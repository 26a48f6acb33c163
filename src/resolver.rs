//! Rate resolution: cache, then store, then provider, writing back on every
//! miss.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::cache::{RATE_TTL, RateCache, record_cache_outcome};
use crate::core::context::CallContext;
use crate::core::currency::Currency;
use crate::core::error::RateError;
use crate::core::provider::RateProvider;
use crate::core::store::{CurrencyStore, StoreError};

pub struct RateResolver {
    cache: Arc<dyn RateCache>,
    store: Arc<dyn CurrencyStore>,
    provider: Arc<dyn RateProvider>,
}

impl RateResolver {
    pub fn new(
        cache: Arc<dyn RateCache>,
        store: Arc<dyn CurrencyStore>,
        provider: Arc<dyn RateProvider>,
    ) -> Self {
        Self {
            cache,
            store,
            provider,
        }
    }

    /// Resolves the rate of `code` against the base currency.
    ///
    /// The three tiers are consulted strictly in order and each one only on a
    /// miss of the previous one. Store and provider failures propagate;
    /// cache failures are logged and never fail the lookup.
    #[instrument(skip(self, ctx))]
    pub async fn resolve(&self, ctx: &CallContext, code: &str) -> Result<f64, RateError> {
        match ctx.guard(self.cache.get(code)).await? {
            Ok(Some(rate)) => {
                debug!(rate, "Rate served from cache");
                return Ok(rate);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Cache lookup failed, treating as miss"),
        }

        if let Some(currency) = ctx.guard(self.store.get_by_code(code)).await?? {
            debug!(rate = currency.rate, "Rate served from store");
            self.write_back(ctx, code, currency.rate).await;
            return Ok(currency.rate);
        }

        let snapshot = ctx.guard(self.provider.fetch_snapshot()).await??;
        let rate = snapshot
            .rate(code)
            .ok_or_else(|| RateError::CurrencyNotFound(code.to_string()))?;

        let currency = Currency::new(code.to_ascii_uppercase(), rate);
        let rate = match ctx.guard(self.store.create(&currency)).await? {
            Ok(()) => {
                info!(rate, "Persisted rate fetched from provider");
                rate
            }
            // someone else created the record first, the stored rate wins
            Err(StoreError::Duplicate(_)) => {
                match ctx.guard(self.store.get_by_code(&currency.code)).await?? {
                    Some(stored) => {
                        debug!(rate = stored.rate, "Currency already persisted");
                        stored.rate
                    }
                    None => rate,
                }
            }
            Err(e) => return Err(e.into()),
        };

        self.write_back(ctx, code, rate).await;
        Ok(rate)
    }

    async fn write_back(&self, ctx: &CallContext, code: &str, rate: f64) {
        let outcome = ctx.guard(self.cache.set(code, rate, RATE_TTL)).await;
        record_cache_outcome("set", code, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::testing::{CountingCache, CountingStore, StaticProvider};
    use std::time::Duration;

    struct Fixture {
        cache: Arc<CountingCache>,
        store: Arc<CountingStore>,
        provider: Arc<StaticProvider>,
        resolver: RateResolver,
    }

    fn fixture(cache: CountingCache, store: CountingStore, provider: StaticProvider) -> Fixture {
        let cache = Arc::new(cache);
        let store = Arc::new(store);
        let provider = Arc::new(provider);
        let resolver = RateResolver::new(cache.clone(), store.clone(), provider.clone());
        Fixture {
            cache,
            store,
            provider,
            resolver,
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store_and_provider() {
        let f = fixture(
            CountingCache::default(),
            CountingStore::default(),
            StaticProvider::with_rates(&[("EUR", 0.85)]),
        );
        f.cache.inner.set("EUR", 0.9, RATE_TTL).await.unwrap();

        let rate = f.resolver.resolve(&CallContext::new(), "EUR").await.unwrap();

        assert_eq!(rate, 0.9);
        assert_eq!(f.cache.gets(), 1);
        assert_eq!(f.store.gets(), 0);
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_store_hit_writes_back_into_cache() {
        let f = fixture(
            CountingCache::default(),
            CountingStore::seeded(&[Currency::new("EUR", 0.85)]).await,
            StaticProvider::unavailable(),
        );
        let ctx = CallContext::new();

        assert_eq!(f.resolver.resolve(&ctx, "EUR").await.unwrap(), 0.85);
        assert_eq!(f.store.gets(), 1);
        assert_eq!(f.cache.sets(), 1);
        assert_eq!(f.cache.last_ttl(), Some(Duration::from_secs(3600)));

        // second lookup is a cache hit
        assert_eq!(f.resolver.resolve(&ctx, "EUR").await.unwrap(), 0.85);
        assert_eq!(f.store.gets(), 1);
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_hit_persists_and_caches() {
        let f = fixture(
            CountingCache::default(),
            CountingStore::default(),
            StaticProvider::with_rates(&[("EUR", 0.85), ("GBP", 0.79)]),
        );
        let ctx = CallContext::new();

        let rate = f.resolver.resolve(&ctx, "GBP").await.unwrap();

        assert_eq!(rate, 0.79);
        assert_eq!(f.provider.calls(), 1);
        let stored = f.store.inner.get_by_code("GBP").await.unwrap().unwrap();
        assert_eq!(stored.rate, 0.79);
        assert!(stored.updated_by.is_none());
        assert_eq!(f.cache.inner.get("GBP").await.unwrap(), Some(0.79));
        assert_eq!(f.cache.last_ttl(), Some(Duration::from_secs(3600)));
        // only the requested code is persisted
        assert!(f.store.inner.get_by_code("EUR").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_from_snapshot_is_not_found() {
        let f = fixture(
            CountingCache::default(),
            CountingStore::default(),
            StaticProvider::with_rates(&[("EUR", 0.85)]),
        );

        let err = f
            .resolver
            .resolve(&CallContext::new(), "XYZ")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CurrencyNotFound);
        assert_eq!(err.to_string(), "currency XYZ not found");
        assert_eq!(f.store.writes(), 0);
        assert_eq!(f.cache.sets(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_unavailable() {
        let f = fixture(
            CountingCache::default(),
            CountingStore::default(),
            StaticProvider::unavailable(),
        );

        let err = f
            .resolver
            .resolve(&CallContext::new(), "EUR")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
        assert_eq!(f.provider.calls(), 1);
        assert_eq!(f.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_cache_failures_never_fail_resolution() {
        let f = fixture(
            CountingCache::failing(),
            CountingStore::seeded(&[Currency::new("EUR", 0.85)]).await,
            StaticProvider::with_rates(&[("GBP", 0.79)]),
        );
        let ctx = CallContext::new();

        assert_eq!(f.resolver.resolve(&ctx, "EUR").await.unwrap(), 0.85);
        assert_eq!(f.resolver.resolve(&ctx, "GBP").await.unwrap(), 0.79);
        assert_eq!(f.cache.sets(), 2);
        assert!(f.store.inner.get_by_code("GBP").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = CountingStore::default();
        store
            .fail_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let f = fixture(
            CountingCache::default(),
            store,
            StaticProvider::with_rates(&[("EUR", 0.85)]),
        );

        let err = f
            .resolver
            .resolve(&CallContext::new(), "EUR")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(f.cache.sets(), 0);
    }

    #[tokio::test]
    async fn test_concurrently_persisted_currency_still_resolves() {
        let f = fixture(
            CountingCache::default(),
            CountingStore::default(),
            StaticProvider::with_rates(&[("EUR", 0.85)]),
        );
        let ctx = CallContext::new();

        let (a, b) = tokio::join!(
            f.resolver.resolve(&ctx, "EUR"),
            f.resolver.resolve(&ctx, "EUR")
        );

        assert_eq!(a.unwrap(), 0.85);
        assert_eq!(b.unwrap(), 0.85);
        assert_eq!(f.store.inner.len().await, 1);
    }

    /// Store that misses on the first lookup, as if the record was created
    /// right after it.
    #[derive(Default)]
    struct LateCreateStore {
        inner: CountingStore,
        first_get_done: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl CurrencyStore for LateCreateStore {
        async fn get_by_code(&self, code: &str) -> Result<Option<Currency>, StoreError> {
            if !self
                .first_get_done
                .swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                return Ok(None);
            }
            self.inner.get_by_code(code).await
        }

        async fn create(&self, currency: &Currency) -> Result<(), StoreError> {
            self.inner.create(currency).await
        }

        async fn update(&self, currency: &Currency) -> Result<(), StoreError> {
            self.inner.update(currency).await
        }

        async fn delete(&self, code: &str) -> Result<(), StoreError> {
            self.inner.delete(code).await
        }
    }

    #[tokio::test]
    async fn test_lost_create_race_serves_stored_rate() {
        let store = LateCreateStore {
            inner: CountingStore::seeded(&[Currency::new("EUR", 0.9)]).await,
            ..Default::default()
        };
        let cache = Arc::new(CountingCache::default());
        let resolver = RateResolver::new(
            cache.clone(),
            Arc::new(store),
            Arc::new(StaticProvider::with_rates(&[("EUR", 0.85)])),
        );

        let rate = resolver.resolve(&CallContext::new(), "EUR").await.unwrap();

        assert_eq!(rate, 0.9);
        assert_eq!(cache.inner.get("EUR").await.unwrap(), Some(0.9));
    }

    #[tokio::test]
    async fn test_cancelled_context_is_not_a_miss() {
        let f = fixture(
            CountingCache::default(),
            CountingStore::default(),
            StaticProvider::with_rates(&[("EUR", 0.85)]),
        );
        let ctx = CallContext::new();
        ctx.cancel();

        let err = f.resolver.resolve(&ctx, "EUR").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(f.cache.gets(), 0);
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_slow_provider_exceeds_deadline() {
        let f = fixture(
            CountingCache::default(),
            CountingStore::default(),
            StaticProvider::with_rates(&[("EUR", 0.85)]).slow(Duration::from_secs(30)),
        );
        let ctx = CallContext::new().with_timeout(Duration::from_millis(20));

        let err = f.resolver.resolve(&ctx, "EUR").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
        assert_eq!(f.store.writes(), 0);
    }
}
