//! Rate cache contract.
//!
//! The cache is an accelerator in front of the store and never a source of
//! truth. Failures of cache writes are advisory: they are recorded through
//! [`record_cache_outcome`] and never turned into a failed operation.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::context::Interrupted;

/// TTL applied to every rate the service writes into the cache.
pub const RATE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait RateCache: Send + Sync {
    async fn get(&self, code: &str) -> Result<Option<f64>, CacheError>;

    async fn set(&self, code: &str, rate: f64, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, code: &str) -> Result<(), CacheError>;
}

/// Sink for the advisory side of a cache write.
///
/// Successes are logged at debug level, failures and interruptions become
/// warn events with `cache_op`, `code` and `error` fields so they stay
/// observable without affecting the caller.
pub(crate) fn record_cache_outcome(
    op: &'static str,
    code: &str,
    outcome: Result<Result<(), CacheError>, Interrupted>,
) {
    match outcome {
        Ok(Ok(())) => debug!(cache_op = op, code, "cache updated"),
        Ok(Err(e)) => warn!(cache_op = op, code, error = %e, "cache write failed"),
        Err(interrupted) => warn!(
            cache_op = op,
            code,
            error = ?interrupted,
            "cache write interrupted"
        ),
    }
}
