//! Typed repository over a [`RecordStore`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::store::{QueryFilter, RecordStore};

/// Repository for one record type.
pub struct Repository<T> {
    store: Arc<dyn RecordStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Get a record by ID.
    pub async fn get(&self, id: &str) -> StoreResult<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(value) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    /// Get a record by ID, failing with `NotFound` when absent.
    pub async fn require(&self, id: &str) -> StoreResult<T> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(T::COLLECTION, id))
    }

    /// Insert or replace a record.
    pub async fn put(&self, record: &T) -> StoreResult<()> {
        let id = record.record_id();
        let value = serde_json::to_value(record)?;
        debug!(collection = T::COLLECTION, id = %id, "Storing record");
        self.store.put(T::COLLECTION, &id, value).await
    }

    pub async fn put_all(&self, records: &[T]) -> StoreResult<()> {
        for record in records {
            self.put(record).await?;
        }
        Ok(())
    }

    /// Records matching `filter`, ordered by ID.
    pub async fn query(&self, filter: &QueryFilter) -> StoreResult<Vec<T>> {
        self.store
            .query(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.store.delete(T::COLLECTION, id).await
    }
}

fn decode<T: Record>(value: Value) -> StoreResult<T> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::invalid_record(T::COLLECTION, e.to_string()))
}
