//! Cross-rate conversion through the common base currency.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::context::CallContext;
use crate::core::error::RateError;
use crate::resolver::RateResolver;

/// Outcome of a conversion, serialized as the `/convert` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub result: f64,
    pub to: String,
}

/// Converts `amount` units of a currency worth `from_rate` into a currency
/// worth `to_rate`, both quoted against the same base. No rounding.
pub fn convert_amount(amount: f64, from_rate: f64, to_rate: f64) -> f64 {
    let base_amount = amount / from_rate;
    base_amount * to_rate
}

pub struct Converter {
    resolver: Arc<RateResolver>,
}

impl Converter {
    pub fn new(resolver: Arc<RateResolver>) -> Self {
        Self { resolver }
    }

    /// Resolves both rates, `from` first, and converts. Resolution happens
    /// for every amount including zero, so a failing lookup is always
    /// reported.
    #[instrument(skip(self, ctx))]
    pub async fn convert(
        &self,
        ctx: &CallContext,
        from: &str,
        to: &str,
        amount: f64,
    ) -> Result<Conversion, RateError> {
        let from_rate = self.resolver.resolve(ctx, from).await?;
        let to_rate = self.resolver.resolve(ctx, to).await?;
        let result = convert_amount(amount, from_rate, to_rate);
        debug!(from_rate, to_rate, result, "Converted amount");

        Ok(Conversion {
            amount,
            from: from.to_string(),
            result,
            to: to.to_string(),
        })
    }
}
