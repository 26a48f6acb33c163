//! Currency administration.
//!
//! The store is authoritative: its result decides the outcome of every
//! operation. The cache is only kept in step on a best-effort basis.

use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::core::cache::{RATE_TTL, RateCache, record_cache_outcome};
use crate::core::context::CallContext;
use crate::core::currency::Currency;
use crate::core::error::RateError;
use crate::core::store::{CurrencyStore, StoreError};

pub struct CurrencyAdmin {
    store: Arc<dyn CurrencyStore>,
    cache: Arc<dyn RateCache>,
}

impl CurrencyAdmin {
    pub fn new(store: Arc<dyn CurrencyStore>, cache: Arc<dyn RateCache>) -> Self {
        Self { store, cache }
    }

    #[instrument(skip(self, ctx, currency), fields(code = %currency.code, rate = currency.rate))]
    pub async fn add(&self, ctx: &CallContext, currency: Currency) -> Result<(), RateError> {
        if ctx.guard(self.store.get_by_code(&currency.code)).await??.is_some() {
            return Err(RateError::AlreadyExists(currency.code));
        }

        ctx.guard(self.store.create(&currency))
            .await?
            .map_err(|e| match e {
                StoreError::Duplicate(code) => RateError::AlreadyExists(code),
                other => other.into(),
            })?;
        info!("Currency added");

        let outcome = ctx
            .guard(self.cache.set(&currency.code, currency.rate, RATE_TTL))
            .await;
        record_cache_outcome("set", &currency.code, outcome);
        Ok(())
    }

    #[instrument(skip(self, ctx))]
    pub async fn update(
        &self,
        ctx: &CallContext,
        code: &str,
        rate: f64,
        actor: Option<Uuid>,
    ) -> Result<Currency, RateError> {
        let mut currency = ctx
            .guard(self.store.get_by_code(code))
            .await??
            .ok_or_else(|| RateError::CurrencyNotFound(code.to_string()))?;

        currency.revise(rate, actor);
        ctx.guard(self.store.update(&currency))
            .await?
            .map_err(|e| match e {
                StoreError::NotFound(code) => RateError::CurrencyNotFound(code),
                other => other.into(),
            })?;
        info!("Currency updated");

        let outcome = ctx.guard(self.cache.set(code, rate, RATE_TTL)).await;
        record_cache_outcome("set", code, outcome);
        Ok(currency)
    }

    #[instrument(skip(self, ctx))]
    pub async fn remove(&self, ctx: &CallContext, code: &str) -> Result<(), RateError> {
        if ctx.guard(self.store.get_by_code(code)).await??.is_none() {
            return Err(RateError::CurrencyNotFound(code.to_string()));
        }

        ctx.guard(self.store.delete(code))
            .await?
            .map_err(|e| match e {
                StoreError::NotFound(code) => RateError::CurrencyNotFound(code),
                other => other.into(),
            })?;
        info!("Currency removed");

        let outcome = ctx.guard(self.cache.delete(code)).await;
        record_cache_outcome("delete", code, outcome);
        Ok(())
    }
}
