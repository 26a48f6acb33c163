//! Currency store contract. The store is the single source of truth.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::currency::Currency;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("currency {0} already stored")]
    Duplicate(String),

    #[error("currency {0} not stored")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CurrencyStore: Send + Sync {
    async fn get_by_code(&self, code: &str) -> Result<Option<Currency>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the code is already stored.
    async fn create(&self, currency: &Currency) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] if the code is not stored.
    async fn update(&self, currency: &Currency) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] if the code is not stored.
    async fn delete(&self, code: &str) -> Result<(), StoreError>;
}
