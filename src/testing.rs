//! Instrumented collaborators shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::cache::{CacheError, RateCache};
use crate::core::currency::{Currency, RateSnapshot};
use crate::core::provider::{ProviderError, RateProvider};
use crate::core::store::{CurrencyStore, StoreError};
use crate::store::memory::{MemoryCurrencyStore, MemoryRateCache};

/// Memory cache that counts calls and can be told to fail.
#[derive(Default)]
pub struct CountingCache {
    pub inner: MemoryRateCache,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    last_ttl: Mutex<Option<Duration>>,
}

impl CountingCache {
    pub fn failing() -> Self {
        let cache = Self::default();
        cache.fail_reads.store(true, Ordering::SeqCst);
        cache.fail_writes.store(true, Ordering::SeqCst);
        cache
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// TTL passed to the most recent `set`, failed ones included.
    pub fn last_ttl(&self) -> Option<Duration> {
        *self.last_ttl.lock().unwrap()
    }
}

#[async_trait]
impl RateCache for CountingCache {
    async fn get(&self, code: &str) -> Result<Option<f64>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("connection refused".to_string()));
        }
        self.inner.get(code).await
    }

    async fn set(&self, code: &str, rate: f64, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        *self.last_ttl.lock().unwrap() = Some(ttl);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("connection refused".to_string()));
        }
        self.inner.set(code, rate, ttl).await
    }

    async fn delete(&self, code: &str) -> Result<(), CacheError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("connection refused".to_string()));
        }
        self.inner.delete(code).await
    }
}

/// Memory store that counts reads and mutations.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryCurrencyStore,
    pub gets: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail_writes: AtomicBool,
}

impl CountingStore {
    pub async fn seeded(currencies: &[Currency]) -> Self {
        let store = Self::default();
        for currency in currencies {
            store.inner.create(currency).await.unwrap();
        }
        store
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CurrencyStore for CountingStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<Currency>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_code(code).await
    }

    async fn create(&self, currency: &Currency) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.create(currency).await
    }

    async fn update(&self, currency: &Currency) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.update(currency).await
    }

    async fn delete(&self, code: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.delete(code).await
    }
}

/// Provider serving a fixed table, or failing every call.
#[derive(Default)]
pub struct StaticProvider {
    rates: Mutex<Option<HashMap<String, f64>>>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StaticProvider {
    pub fn with_rates(rates: &[(&str, f64)]) -> Self {
        let table = rates
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect();
        Self {
            rates: Mutex::new(Some(table)),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for StaticProvider {
    async fn fetch_snapshot(&self) -> Result<RateSnapshot, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let rates = self.rates.lock().unwrap().clone();
        rates
            .map(RateSnapshot::new)
            .ok_or_else(|| ProviderError::Status("503 Service Unavailable".to_string()))
    }
}
