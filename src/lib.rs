pub mod admin;
pub mod api;
pub mod cli;
pub mod convert;
pub mod core;
pub mod providers;
pub mod refresh;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::admin::CurrencyAdmin;
use crate::api::AppState;
use crate::convert::Converter;
use crate::core::config::AppConfig;
use crate::core::{CurrencyStore, RateCache, RateProvider};
use crate::providers::OpenExchangeRatesProvider;
use crate::refresh::RateRefresher;
use crate::resolver::RateResolver;
use crate::store::MemoryRateCache;

/// Fully wired service, ready to be served.
pub struct App {
    pub router: Router,
    pub refresher: Option<RateRefresher>,
}

/// Wires cache, store and provider into the engine and the HTTP router.
pub fn build_app(config: &AppConfig) -> Result<App> {
    let cache: Arc<dyn RateCache> = Arc::new(MemoryRateCache::new());
    let store: Arc<dyn CurrencyStore> = store::open_store(config)?;
    let provider: Arc<dyn RateProvider> = Arc::new(
        OpenExchangeRatesProvider::new(
            &config.provider.base_url,
            config.provider.app_id.clone(),
            Duration::from_secs(config.provider.timeout_secs),
            config.provider.retries,
        )
        .context("Failed to create rate provider")?,
    );

    let resolver = RateResolver::new(cache.clone(), store.clone(), provider.clone());
    let state = AppState {
        converter: Arc::new(Converter::new(Arc::new(resolver))),
        admin: Arc::new(CurrencyAdmin::new(store.clone(), cache.clone())),
        request_timeout: config.server.request_timeout(),
    };

    let refresher = config
        .refresh
        .interval()
        .map(|interval| RateRefresher::new(provider, store, cache, interval));

    Ok(App {
        router: api::router(state),
        refresher,
    })
}

pub async fn run(config_path: Option<&str>) -> Result<()> {
    info!("xrate starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = build_app(&config)?;
    let shutdown = CancellationToken::new();

    let refresher = app
        .refresher
        .map(|refresher| tokio::spawn(refresher.run(shutdown.clone())));

    let listener = tokio::net::TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    info!("Listening on {}", config.server.listen_addr);

    let signal = shutdown.clone();
    axum::serve(listener, app.router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            signal.cancel();
        })
        .await
        .context("HTTP server failed")?;

    shutdown.cancel();
    if let Some(handle) = refresher {
        handle.await.context("Rate refresher task failed")?;
    }
    info!("xrate stopped");
    Ok(())
}
