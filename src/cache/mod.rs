//! Distributed cache client.
//!
//! This module provides the key-value cache used to memoize lookups:
//! - Namespaced keys ([`CacheKey`])
//! - Value serialization ([`Serializer`])
//! - Pluggable storage ([`CacheBackend`]): Redis, or in-process memory
//! - [`Cache::get_or_insert_with`], the read-through wrapper used by accessors

pub mod backend;
pub mod key;
pub mod memory;
pub mod redis;
pub mod serializer;

pub use backend::CacheBackend;
pub use key::CacheKey;
pub use memory::MemoryBackend;
pub use self::redis::{RedisBackend, RedisConnection, RedisManager, RedisPool};
pub use serializer::Serializer;

use crate::config::{CacheBackendKind, CacheOptions};
use crate::error::AppResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Serializer plus backend. Cheap to clone; clones share the backend.
#[derive(Debug, Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
    serializer: Serializer,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>, serializer: Serializer) -> Self {
        Self {
            backend,
            serializer,
        }
    }

    /// In-process cache, mostly for tests and local runs.
    pub fn memory(serializer: Serializer) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), serializer)
    }

    /// Build the backend selected in `options`.
    pub async fn connect(options: &CacheOptions) -> AppResult<Self> {
        let backend: Arc<dyn CacheBackend> = match options.backend {
            CacheBackendKind::Redis => Arc::new(RedisBackend::connect(options).await?),
            CacheBackendKind::Memory => {
                info!("Using in-process memory cache");
                Arc::new(MemoryBackend::new())
            }
        };
        Ok(Self::new(backend, options.serializer))
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn serializer(&self) -> Serializer {
        self.serializer
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        match self.backend.get(&key.render()).await? {
            Some(bytes) => Ok(Some(self.serializer.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> AppResult<()> {
        let bytes = self.serializer.encode(value)?;
        self.backend.set(&key.render(), bytes, ttl).await
    }

    pub async fn delete(&self, key: &CacheKey) -> AppResult<bool> {
        self.backend.delete(&key.render()).await
    }

    pub async fn exists(&self, key: &CacheKey) -> AppResult<bool> {
        self.backend.exists(&key.render()).await
    }

    /// Remove every entry in `namespace`.
    pub async fn clear(&self, namespace: &str) -> AppResult<u64> {
        self.backend
            .clear(&CacheKey::namespace_prefix(namespace))
            .await
    }

    /// Return the cached value under `key`, or run `loader`, store its result and return it.
    ///
    /// There is no single-flight: concurrent misses each run `loader` and the last
    /// write wins. Loader errors are returned as-is and nothing is cached.
    pub async fn get_or_insert_with<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        loader: F,
    ) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(value) = self.get(key).await? {
            debug!(key = %key, backend = self.backend.name(), "Cache hit");
            return Ok(value);
        }

        debug!(key = %key, backend = self.backend.name(), "Cache miss");
        let value = loader().await?;
        self.set(key, &value, ttl).await?;
        Ok(value)
    }

    /// Release backend connections.
    pub async fn close(&self) {
        self.backend.close().await;
    }
}
