//! Redis-backed record store.
//!
//! Each record is a JSON string under `{prefix}:{collection}:{id}`; a set at
//! `{prefix}:{collection}:_ids` indexes the collection for queries.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::{QueryFilter, RecordStore};

pub struct RedisStore {
    client: redis::Client,
    prefix: String,
}

impl RedisStore {
    /// Create a store; no connection is made until first use.
    pub fn new(redis_url: &str, prefix: impl Into<String>) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }

    fn record_key(&self, collection: &str, id: &str) -> String {
        format!("{}:{}:{}", self.prefix, collection, id)
    }

    fn index_key(&self, collection: &str) -> String {
        format!("{}:{}:_ids", self.prefix, collection)
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let mut conn = self.connection().await?;
        let payload: Option<String> = conn.get(self.record_key(collection, id)).await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(&record)?;

        debug!("Storing {}/{} in Redis", collection, id);
        redis::pipe()
            .atomic()
            .set(self.record_key(collection, id), payload)
            .ignore()
            .sadd(self.index_key(collection), id)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn query(&self, collection: &str, filter: &QueryFilter) -> StoreResult<Vec<Value>> {
        let mut conn = self.connection().await?;
        let mut ids: Vec<String> = conn.smembers(self.index_key(collection)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        ids.sort();

        let keys: Vec<String> = ids.iter().map(|id| self.record_key(collection, id)).collect();
        let payloads: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        let mut records = Vec::with_capacity(payloads.len());
        for (id, payload) in ids.iter().zip(payloads) {
            match payload {
                Some(json) => records.push(serde_json::from_str(&json)?),
                None => warn!("Index entry {}/{} has no record", collection, id),
            }
        }

        Ok(filter.apply(records))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let (removed, _): (u32, u32) = redis::pipe()
            .atomic()
            .del(self.record_key(collection, id))
            .srem(self.index_key(collection), id)
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }
}
