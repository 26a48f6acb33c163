//! Currency records and provider rate snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A currency known to the service.
///
/// `rate` is the value of one unit of `code` expressed against the common
/// base (USD-equivalent). It is always positive and `code` is always three
/// uppercase ASCII letters; both are guaranteed by the validator before a
/// record is built from user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

impl Currency {
    pub fn new(code: impl Into<String>, rate: f64) -> Self {
        Self {
            code: code.into(),
            rate,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    pub fn with_actor(mut self, actor: Option<Uuid>) -> Self {
        self.updated_by = actor;
        self
    }

    /// Replaces the rate and stamps the record with the acting principal.
    pub fn revise(&mut self, rate: f64, actor: Option<Uuid>) {
        self.rate = rate;
        self.updated_at = Utc::now();
        self.updated_by = actor;
    }
}

/// Full set of rates returned by a provider in one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSnapshot {
    pub base: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub rates: HashMap<String, f64>,
}

impl RateSnapshot {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self {
            rates,
            ..Default::default()
        }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
