use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MetricStore, StoreError, StoredMetric};

/// Records kept before the oldest are evicted.
pub const MAX_MEMORY_RECORDS: usize = 10_000;

/// In-process store selected with `STORE_URL=memory://`.
///
/// Nothing survives a restart, and only the newest `capacity` records are
/// kept. Useful for running the dashboard without Redis and for exercising
/// the HTTP layer in tests.
pub struct MemoryStore {
    /// Ordered oldest → newest by `StoredMetric::order_key`.
    records: Mutex<VecDeque<StoredMetric>>,
    capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(MAX_MEMORY_RECORDS)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024) + 1)),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn append(&self, record: &StoredMetric) -> Result<(), StoreError> {
        let key = record.order_key();
        let mut records = self.records.lock();

        // Usually lands at the back; equal keys go after existing ones.
        let at = records.partition_point(|r| r.order_key() <= key);
        records.insert(at, record.clone());

        while records.len() > self.capacity {
            records.pop_front();
        }
        Ok(())
    }

    async fn newest(&self, limit: usize) -> Result<Vec<StoredMetric>, StoreError> {
        Ok(self.records.lock().iter().rev().take(limit).cloned().collect())
    }
}
