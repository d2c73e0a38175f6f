//! Sample persistence.
//!
//! `Persistence` is the adapter handlers talk to. It owns at most one
//! backend (`MetricStore`) for the life of the process and reports every
//! failure as a typed `StoreError`. Whether to degrade or fail is the
//! caller's decision.

pub mod memory;
pub mod redis_client;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, StoreBackend};
use crate::metrics::MetricSample;

pub use self::memory::MemoryStore;
pub use self::redis_client::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is not connected")]
    Unavailable,
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("could not encode or decode stored metric: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}

/// A persisted sample plus the timestamps the store manages itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMetric {
    #[serde(flatten)]
    pub sample: MetricSample,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl StoredMetric {
    pub fn new(sample: MetricSample) -> Self {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            sample,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Sort key: the sample timestamp in epoch milliseconds, falling back
    /// to the creation time if the sample carries an unparseable stamp.
    pub fn sort_key(&self) -> i64 {
        DateTime::parse_from_rfc3339(&self.sample.timestamp)
            .or_else(|_| DateTime::parse_from_rfc3339(&self.created_at))
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    }

    /// Full ordering: timestamp first, then `request_count` for samples
    /// stamped in the same millisecond.
    pub fn order_key(&self) -> (i64, u64) {
        (self.sort_key(), self.sample.request_count)
    }
}

/// A backend capable of appending samples and returning the latest ones.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Short label for logs, e.g. "redis".
    fn name(&self) -> &'static str;

    async fn append(&self, record: &StoredMetric) -> Result<(), StoreError>;

    /// Up to `limit` records, newest first.
    async fn newest(&self, limit: usize) -> Result<Vec<StoredMetric>, StoreError>;
}

// ─── Persistence adapter ─────────────────────────────────────────

pub struct Persistence {
    store: RwLock<Option<Arc<dyn MetricStore>>>,
    timeout: Duration,
}

impl Persistence {
    pub fn new(store: Arc<dyn MetricStore>, timeout: Duration) -> Self {
        Self {
            store: RwLock::new(Some(store)),
            timeout,
        }
    }

    /// Storage-less mode: every operation reports `Unavailable`.
    pub fn disconnected(timeout: Duration) -> Self {
        Self {
            store: RwLock::new(None),
            timeout,
        }
    }

    /// Open the configured backend. A failed connection is logged and
    /// yields a disconnected adapter instead of an error.
    pub async fn connect(config: &Config) -> Self {
        let timeout = config.store_timeout;

        match &config.store {
            StoreBackend::Memory => {
                tracing::info!("using in-memory metric store");
                Self::new(Arc::new(MemoryStore::new()), timeout)
            }
            StoreBackend::Redis { url, key } => {
                match tokio::time::timeout(timeout, RedisStore::connect(url, key)).await {
                    Ok(Ok(store)) => {
                        tracing::info!(%url, %key, "redis connected");
                        Self::new(Arc::new(store), timeout)
                    }
                    Ok(Err(e)) => {
                        tracing::error!(%url, error = %e, "redis connection failed");
                        tracing::warn!("running without database persistence");
                        Self::disconnected(timeout)
                    }
                    Err(_) => {
                        tracing::error!(%url, ?timeout, "redis connection timed out");
                        tracing::warn!("running without database persistence");
                        Self::disconnected(timeout)
                    }
                }
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.store.read().is_some()
    }

    fn handle(&self) -> Result<Arc<dyn MetricStore>, StoreError> {
        self.store.read().clone().ok_or(StoreError::Unavailable)
    }

    /// Append one sample. Attempted exactly once, bounded by the store
    /// timeout.
    pub async fn save(&self, sample: &MetricSample) -> Result<(), StoreError> {
        let store = self.handle()?;
        let record = StoredMetric::new(sample.clone());

        tokio::time::timeout(self.timeout, store.append(&record))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;

        tracing::debug!(
            store = store.name(),
            request_count = sample.request_count,
            "metric saved"
        );
        Ok(())
    }

    /// Up to `limit` most recent samples in chronological order
    /// (oldest first), with store metadata stripped.
    pub async fn query_recent(&self, limit: usize) -> Result<Vec<MetricSample>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let store = self.handle()?;

        let mut records = tokio::time::timeout(self.timeout, store.newest(limit))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;

        records.truncate(limit);
        records.reverse();
        Ok(records.into_iter().map(|r| r.sample).collect())
    }

    /// Release the store connection. Safe to call more than once.
    pub async fn shutdown(&self) {
        let released = self.store.write().take();
        match released {
            Some(store) => tracing::info!(store = store.name(), "store connection closed"),
            None => tracing::debug!("store already closed"),
        }
    }
}
