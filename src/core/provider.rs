//! Rate provider contract

use async_trait::async_trait;
use thiserror::Error;

use crate::core::currency::RateSnapshot;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP error: {0}")]
    Status(String),

    #[error("failed to decode rates: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        let value = value.without_url();
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Request(value.to_string())
        }
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<RateSnapshot, ProviderError>;
}
