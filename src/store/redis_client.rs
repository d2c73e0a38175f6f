use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{MetricStore, StoreError, StoredMetric};

/// History kept in a single Redis sorted set.
///
/// Each member is a JSON-encoded `StoredMetric`, scored by its sample
/// timestamp in epoch milliseconds with the request count in the low three
/// digits (see `score`), so `ZREVRANGE` yields newest first even within one
/// millisecond.
///
/// `ConnectionManager` is cheaply cloneable: every clone shares the same
/// multiplexed TCP connection and reconnects on its own after a drop.
pub struct RedisStore {
    conn: ConnectionManager,
    key: String,
}

impl RedisStore {
    pub async fn connect(url: &str, key: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let conn = ConnectionManager::new(client).await.map_err(backend)?;

        Ok(Self {
            conn,
            key: key.to_owned(),
        })
    }
}

#[async_trait]
impl MetricStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn append(&self, record: &StoredMetric) -> Result<(), StoreError> {
        let member = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .zadd(&self.key, member, score(record))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn newest(&self, limit: usize) -> Result<Vec<StoredMetric>, StoreError> {
        let stop = isize::try_from(limit).unwrap_or(isize::MAX) - 1;
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .zrevrange(&self.key, 0, stop)
            .await
            .map_err(backend)?;

        let mut records = decode_members(&members)?;
        records.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
        Ok(records)
    }
}

/// `millis * 1000 + request_count % 1000`. Stays below 2^53 for any
/// timestamp before year 2255, so the f64 score is exact.
fn score(record: &StoredMetric) -> f64 {
    let (millis, count) = record.order_key();
    (millis as f64) * 1000.0 + (count % 1000) as f64
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn decode_members(members: &[String]) -> Result<Vec<StoredMetric>, StoreError> {
    members
        .iter()
        .map(|m| serde_json::from_str(m).map_err(StoreError::from))
        .collect()
}
