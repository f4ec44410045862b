//! Storage-engine-agnostic record access.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// Key/value record store organised in collections.
///
/// Records are JSON documents keyed by stable string IDs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Insert or replace the record stored under `id`.
    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()>;

    /// Records matching `filter`, ordered by ID.
    async fn query(&self, collection: &str, filter: &QueryFilter) -> StoreResult<Vec<Value>>;

    /// Remove a record; returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;
}

/// Field-equality filter over JSON records.
///
/// Field names may be dotted (`options.language`) to reach nested values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    conditions: Vec<(String, Value)>,
    limit: Option<usize>,
}

impl QueryFilter {
    /// Filter matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| lookup(record, field) == Some(expected))
    }

    /// Apply the filter and limit to records already ordered by ID.
    pub fn apply<I>(&self, records: I) -> Vec<Value>
    where
        I: IntoIterator<Item = Value>,
    {
        let matching = records.into_iter().filter(|r| self.matches(r));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

fn lookup<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(record, |value, segment| value.get(segment))
}
