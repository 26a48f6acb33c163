use crate::core::currency::Currency;
use crate::core::store::{CurrencyStore, StoreError};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

const PARTITION: &str = "currencies";

impl From<fjall::Error> for StoreError {
    fn from(value: fjall::Error) -> Self {
        Self::Backend(value.to_string())
    }
}

/// Durable currency store on a fjall keyspace.
///
/// Records are JSON documents keyed by currency code. Writers are serialised
/// so the existence checks behind `Duplicate` and `NotFound` cannot race.
/// Disk work, including the fsync after each write, runs on the blocking
/// thread pool.
pub struct FjallCurrencyStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
    write_lock: Mutex<()>,
}

fn read(partition: &PartitionHandle, code: &str) -> Result<Option<Currency>, StoreError> {
    match partition.get(code)? {
        Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
        None => Ok(None),
    }
}

fn write(
    keyspace: &Keyspace,
    partition: &PartitionHandle,
    currency: &Currency,
) -> Result<(), StoreError> {
    let value = serde_json::to_vec(currency)?;
    partition.insert(currency.code.as_bytes(), value)?;
    keyspace.persist(PersistMode::SyncAll)?;
    Ok(())
}

impl FjallCurrencyStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(db_path).map_err(|e| StoreError::Backend(e.to_string()))?;

        let keyspace = Config::new(db_path).open()?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened currency store at {}", db_path.display());
        Ok(Self {
            keyspace,
            partition,
            write_lock: Mutex::new(()),
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Keyspace, &PartitionHandle) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let keyspace = self.keyspace.clone();
        let partition = self.partition.clone();
        tokio::task::spawn_blocking(move || op(&keyspace, &partition))
            .await
            .map_err(|e| StoreError::Backend(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl CurrencyStore for FjallCurrencyStore {
    async fn get_by_code(&self, code: &str) -> Result<Option<Currency>, StoreError> {
        let key = code.to_string();
        let currency = self.blocking(move |_, partition| read(partition, &key)).await?;
        debug!(code, found = currency.is_some(), "Store GET");
        Ok(currency)
    }

    async fn create(&self, currency: &Currency) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let record = currency.clone();
        self.blocking(move |keyspace, partition| {
            if partition.contains_key(&record.code)? {
                return Err(StoreError::Duplicate(record.code));
            }
            write(keyspace, partition, &record)
        })
        .await?;
        debug!(code = %currency.code, "Store CREATE");
        Ok(())
    }

    async fn update(&self, currency: &Currency) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let record = currency.clone();
        self.blocking(move |keyspace, partition| {
            if !partition.contains_key(&record.code)? {
                return Err(StoreError::NotFound(record.code));
            }
            write(keyspace, partition, &record)
        })
        .await?;
        debug!(code = %currency.code, "Store UPDATE");
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let key = code.to_string();
        self.blocking(move |keyspace, partition| {
            if !partition.contains_key(&key)? {
                return Err(StoreError::NotFound(key));
            }
            partition.remove(key.as_bytes())?;
            keyspace.persist(PersistMode::SyncAll)?;
            Ok(())
        })
        .await?;
        debug!(code, "Store DELETE");
        Ok(())
    }
}
