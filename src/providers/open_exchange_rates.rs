use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::currency::RateSnapshot;
use crate::core::provider::{ProviderError, RateProvider};
use crate::providers::util::with_retry;

const RETRY_DELAY_MS: u64 = 250;

/// Fetches the latest rate table from an Open Exchange Rates compatible API.
pub struct OpenExchangeRatesProvider {
    base_url: String,
    app_id: Option<String>,
    retries: usize,
    client: reqwest::Client,
}

impl OpenExchangeRatesProvider {
    pub fn new(
        base_url: &str,
        app_id: Option<String>,
        timeout: Duration,
        retries: usize,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent("xrate/0.1")
            .timeout(timeout)
            .build()?;
        Ok(OpenExchangeRatesProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id,
            retries,
            client,
        })
    }

    fn latest_url(&self) -> String {
        match &self.app_id {
            Some(app_id) => format!("{}/api/latest.json?app_id={}", self.base_url, app_id),
            None => format!("{}/api/latest.json", self.base_url),
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<LatestResponse, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                // the url carries the app_id
                ProviderError::Request(format!("{} for URL: {}", e.without_url(), self.base_url))
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().to_string()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    base: Option<String>,
    timestamp: Option<i64>,
    rates: HashMap<String, f64>,
}

impl From<LatestResponse> for RateSnapshot {
    fn from(response: LatestResponse) -> Self {
        let rates = response
            .rates
            .into_iter()
            .filter(|(code, rate)| {
                let usable = rate.is_finite() && *rate > 0.0;
                if !usable {
                    warn!(code = %code, rate, "Dropping unusable rate from snapshot");
                }
                usable
            })
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect();

        RateSnapshot {
            base: response.base,
            timestamp: response
                .timestamp
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            rates,
        }
    }
}

#[async_trait]
impl RateProvider for OpenExchangeRatesProvider {
    #[instrument(name = "RateSnapshotFetch", skip(self))]
    async fn fetch_snapshot(&self) -> Result<RateSnapshot, ProviderError> {
        let url = self.latest_url();
        debug!("Requesting rate snapshot from {}", self.base_url);

        let response = with_retry(|| self.fetch_once(&url), self.retries, RETRY_DELAY_MS).await?;
        let snapshot = RateSnapshot::from(response);
        debug!(rates = snapshot.len(), base = ?snapshot.base, "Received rate snapshot");
        Ok(snapshot)
    }
}
