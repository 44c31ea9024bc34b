//! In-process cache backend.
//!
//! Entries live in a map guarded by an async `RwLock`. Expired entries are
//! treated as absent on read and dropped lazily.

use super::backend::CacheBackend;
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it under the write lock, re-checking in case it was replaced
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> AppResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key).is_some_and(|e| !e.is_expired(now)))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries.get(key).is_some_and(|e| !e.is_expired(now)))
    }

    async fn clear(&self, prefix: &str) -> AppResult<u64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let mut removed = 0;
        entries.retain(|k, e| {
            if !k.starts_with(prefix) {
                return true;
            }
            if !e.is_expired(now) {
                removed += 1;
            }
            false
        });
        Ok(removed)
    }

    async fn close(&self) {
        self.entries.write().await.clear();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
