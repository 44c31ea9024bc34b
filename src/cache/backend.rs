//! Storage seam shared by the cache backends.

use crate::error::AppResult;
use async_trait::async_trait;
use std::time::Duration;

/// Raw byte storage behind [`Cache`](super::Cache).
///
/// Keys arrive already rendered (`namespace:key`); values are already serialized.
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Fetch a value, `None` when absent or expired.
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Store a value, replacing any previous one. `ttl = None` keeps it until evicted.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> AppResult<()>;

    /// Remove a value. Returns whether something was removed.
    async fn delete(&self, key: &str) -> AppResult<bool>;

    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Remove every key starting with `prefix`. Returns the number removed.
    async fn clear(&self, prefix: &str) -> AppResult<u64>;

    /// Release connections held by the backend.
    async fn close(&self);

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
