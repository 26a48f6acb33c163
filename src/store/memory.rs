use crate::core::cache::{CacheError, RateCache};
use crate::core::currency::Currency;
use crate::core::store::{CurrencyStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

struct CacheValue {
    rate: f64,
    expires_at: Instant,
}

/// In-memory rate cache with per-entry expiry, checked lazily on read
#[derive(Clone, Default)]
pub struct MemoryRateCache {
    inner: Arc<Mutex<HashMap<String, CacheValue>>>,
}

impl MemoryRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }
}

#[async_trait]
impl RateCache for MemoryRateCache {
    async fn get(&self, code: &str) -> Result<Option<f64>, CacheError> {
        let mut cache = self.inner.lock().await;
        if let Some(entry) = cache.get(code) {
            if entry.expires_at <= Instant::now() {
                debug!("Cache entry expired for key: {}", code);
                cache.remove(code);
                return Ok(None);
            }
            debug!("Cache HIT for key: {}", code);
            return Ok(Some(entry.rate));
        }
        debug!("Cache MISS for key: {}", code);
        Ok(None)
    }

    async fn set(&self, code: &str, rate: f64, ttl: Duration) -> Result<(), CacheError> {
        let value = CacheValue {
            rate,
            expires_at: Instant::now() + ttl,
        };

        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", code);
        cache.insert(code.to_string(), value);
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<(), CacheError> {
        let mut cache = self.inner.lock().await;
        cache.remove(code);
        debug!("Cache REMOVE for key: {}", code);
        Ok(())
    }
}

/// Non-durable currency store, used for tests and ephemeral deployments
#[derive(Clone, Default)]
pub struct MemoryCurrencyStore {
    inner: Arc<RwLock<HashMap<String, Currency>>>,
}

impl MemoryCurrencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl CurrencyStore for MemoryCurrencyStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<Currency>, StoreError> {
        Ok(self.inner.read().await.get(code).cloned())
    }

    async fn create(&self, currency: &Currency) -> Result<(), StoreError> {
        let mut currencies = self.inner.write().await;
        if currencies.contains_key(&currency.code) {
            return Err(StoreError::Duplicate(currency.code.clone()));
        }
        currencies.insert(currency.code.clone(), currency.clone());
        Ok(())
    }

    async fn update(&self, currency: &Currency) -> Result<(), StoreError> {
        let mut currencies = self.inner.write().await;
        match currencies.get_mut(&currency.code) {
            Some(existing) => {
                *existing = currency.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(currency.code.clone())),
        }
    }

    async fn delete(&self, code: &str) -> Result<(), StoreError> {
        let mut currencies = self.inner.write().await;
        currencies
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(code.to_string()))
    }
}
