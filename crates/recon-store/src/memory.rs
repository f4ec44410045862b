//! In-process record store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::store::{QueryFilter, RecordStore};

/// Record store held in memory; contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record);
        Ok(())
    }

    async fn query(&self, collection: &str, filter: &QueryFilter) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(match collections.get(collection) {
            Some(records) => filter.apply(records.values().cloned()),
            None => Vec::new(),
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        Ok(self
            .collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|records| records.remove(id))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_replace() {
        let store = InMemoryStore::new();
        store.put("videos", "v1", json!({"id": "v1", "n": 1})).await.unwrap();
        store.put("videos", "v1", json!({"id": "v1", "n": 2})).await.unwrap();

        let got = store.get("videos", "v1").await.unwrap().unwrap();
        assert_eq!(got["n"], 2);
        assert_eq!(store.len("videos").await, 1);
        assert!(store.get("videos", "v2").await.unwrap().is_none());
        assert!(store.get("suspects", "v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_is_ordered_by_id() {
        let store = InMemoryStore::new();
        for id in ["c", "a", "b"] {
            store
                .put("runs", id, json!({"id": id, "status": "pending"}))
                .await
                .unwrap();
        }
        store
            .put("runs", "d", json!({"id": "d", "status": "running"}))
            .await
            .unwrap();

        let pending = store
            .query("runs", &QueryFilter::all().eq("status", "pending"))
            .await
            .unwrap();
        let ids: Vec<_> = pending.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryStore::new();
        store.put("videos", "v1", json!({})).await.unwrap();
        assert!(store.delete("videos", "v1").await.unwrap());
        assert!(!store.delete("videos", "v1").await.unwrap());
    }
}
