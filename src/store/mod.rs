pub mod disk;
pub mod memory;

use crate::core::config::{AppConfig, StoreBackend};
use crate::core::store::CurrencyStore;
use anyhow::{Context, Result};
use disk::FjallCurrencyStore;
use memory::MemoryCurrencyStore;
use std::sync::Arc;
use tracing::info;

pub use memory::MemoryRateCache;

/// Opens the currency store selected by the configuration.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn CurrencyStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory currency store");
            Ok(Arc::new(MemoryCurrencyStore::new()))
        }
        StoreBackend::Disk => {
            let path = config.default_data_path()?.join("store");
            info!("Using durable currency store at {}", path.display());
            let store = FjallCurrencyStore::open(&path)
                .with_context(|| format!("Failed to open currency store at {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}
