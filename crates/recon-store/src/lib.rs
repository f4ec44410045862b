//! Persistence for videos, suspects, tracking results and analysis runs.
//!
//! Callers depend only on `get` / `put` / `query` semantics through
//! [`RecordStore`]; [`Repository`] adds typed access on top. Two backends are
//! provided: [`InMemoryStore`] for tests and single-process runs, and
//! [`RedisStore`] for shared deployments.

pub mod config;
pub mod error;
pub mod memory;
pub mod record;
pub mod redis_store;
pub mod repository;
pub mod store;

pub use config::{StoreBackend, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use record::Record;
pub use redis_store::RedisStore;
pub use repository::Repository;
pub use store::{QueryFilter, RecordStore};

use std::sync::Arc;

/// Open the configured backend.
pub fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
        StoreBackend::Redis => Ok(Arc::new(RedisStore::new(
            &config.redis_url,
            config.key_prefix.clone(),
        )?)),
    }
}
