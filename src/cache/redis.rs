//! Redis cache backend.
//!
//! Multiplexed `redis` connections are pooled with [`deadpool`]: `pool_min_size`
//! are opened eagerly, more are opened on demand up to `pool_max_size`, and
//! callers beyond that wait for a connection to come back. The configured
//! timeout bounds pool waits, connection setup and every command; with no
//! timeout set, all of them are unbounded.

use super::backend::CacheBackend;
use crate::config::CacheOptions;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use deadpool::managed::{self, Metrics, Object, Pool, PoolError, RecycleResult};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Keys fetched per SCAN round trip when clearing a namespace.
const SCAN_BATCH: usize = 500;

/// Pool of multiplexed Redis connections.
pub type RedisPool = Pool<RedisManager>;

/// A connection checked out of [`RedisPool`]; returned on drop.
pub type RedisConnection = Object<RedisManager>;

/// Opens connections for [`RedisPool`] and checks them with `PING` before reuse.
#[derive(Debug)]
pub struct RedisManager {
    client: Client,
}

impl RedisManager {
    pub fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url).map_err(|e| {
            AppError::connection(
                format!("Invalid cache URL: {}", e),
                "Check CACHE_ENDPOINT / CACHE_PORT",
            )
        })?;
        Ok(Self { client })
    }
}

impl managed::Manager for RedisManager {
    type Type = MultiplexedConnection;
    type Error = RedisError;

    async fn create(&self) -> Result<MultiplexedConnection, RedisError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        debug!("Opened cache connection");
        Ok(conn)
    }

    async fn recycle(
        &self,
        conn: &mut MultiplexedConnection,
        metrics: &Metrics,
    ) -> RecycleResult<RedisError> {
        // Broken connections fail the ping and are dropped by the pool
        let _: String = redis::cmd("PING").query_async(conn).await?;
        debug!(recycle_count = metrics.recycle_count, "Recycled cache connection");
        Ok(())
    }
}

/// Cache backend talking to a Redis server.
#[derive(Debug)]
pub struct RedisBackend {
    pool: RedisPool,
    timeout: Option<Duration>,
}

impl RedisBackend {
    /// Connect to the server described by `options`.
    pub async fn connect(options: &CacheOptions) -> AppResult<Self> {
        options.validate()?;
        info!(
            url = %options.masked_url(),
            pool_min_size = options.pool_min_size,
            pool_max_size = options.pool_max_size,
            timeout_ms = ?options.timeout.map(|t| t.as_millis() as u64),
            "Connecting to cache"
        );

        let manager = RedisManager::new(&options.redis_url())?;
        let pool = Pool::builder(manager)
            .max_size(options.pool_max_size as usize)
            .wait_timeout(options.timeout)
            .create_timeout(options.timeout)
            .recycle_timeout(options.timeout)
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build cache pool: {}", e)))?;

        let backend = Self {
            pool,
            timeout: options.timeout,
        };
        backend.warm_up(options.pool_min_size as usize).await?;

        let status = backend.pool.status();
        info!(
            open = status.size,
            max_size = status.max_size,
            "Cache connected"
        );
        Ok(backend)
    }

    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }

    /// Check out a connection, waiting while every pooled connection is in use.
    pub async fn acquire(&self) -> AppResult<RedisConnection> {
        self.pool.get().await.map_err(|e| self.pool_error(e))
    }

    /// Open `count` connections up front by holding them all at once.
    async fn warm_up(&self, count: usize) -> AppResult<()> {
        let mut held = Vec::with_capacity(count);
        for _ in 0..count {
            held.push(self.acquire().await?);
        }
        debug!(count = held.len(), "Cache pool warmed up");
        Ok(())
    }

    fn pool_error(&self, err: PoolError<RedisError>) -> AppError {
        match err {
            PoolError::Timeout(kind) => {
                let operation = format!("cache pool {:?}", kind).to_lowercase();
                match self.timeout {
                    Some(limit) => AppError::timeout(operation, limit),
                    None => AppError::timed_out(operation),
                }
            }
            PoolError::Backend(e) => e.into(),
            PoolError::Closed => {
                AppError::connection("Cache pool is closed", "Reinitialize the cache")
            }
            other => AppError::internal(format!("Cache pool error: {}", other)),
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| AppError::timeout(operation, limit))?,
            None => fut.await,
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        self.bounded("cache get", async {
            let mut conn = self.acquire().await?;
            let value: Option<Vec<u8>> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> AppResult<()> {
        self.bounded("cache set", async {
            let mut conn = self.acquire().await?;
            let _: () = match ttl {
                Some(ttl) => {
                    redis::cmd("SET")
                        .arg(key)
                        .arg(value)
                        .arg("PX")
                        .arg(ttl.as_millis().max(1) as u64)
                        .query_async(&mut *conn)
                        .await?
                }
                None => conn.set(key, value).await?,
            };
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.bounded("cache delete", async {
            let mut conn = self.acquire().await?;
            let removed: u64 = conn.del(key).await?;
            Ok(removed > 0)
        })
        .await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.bounded("cache exists", async {
            let mut conn = self.acquire().await?;
            let found: bool = conn.exists(key).await?;
            Ok(found)
        })
        .await
    }

    async fn clear(&self, prefix: &str) -> AppResult<u64> {
        self.bounded("cache clear", async {
            let mut conn = self.acquire().await?;
            let pattern = format!("{}*", prefix);
            let mut cursor: u64 = 0;
            let mut removed: u64 = 0;

            // SCAN rather than KEYS so the server is never blocked
            loop {
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut *conn)
                    .await?;

                if !keys.is_empty() {
                    let deleted: u64 = conn.del(&keys).await?;
                    removed += deleted;
                }

                if next == 0 {
                    break;
                }
                cursor = next;
            }

            debug!(prefix = %prefix, removed, "Cleared cache namespace");
            Ok(removed)
        })
        .await
    }

    async fn close(&self) {
        self.pool.close();
        info!("Cache connections closed");
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_options() -> CacheOptions {
        // No eager connections, so nothing dials the server
        CacheOptions {
            endpoint: "redis://:secret@127.0.0.1:6390/0".to_string(),
            pool_min_size: 0,
            pool_max_size: 3,
            timeout: Some(Duration::from_millis(1500)),
            ..CacheOptions::default()
        }
    }

    #[tokio::test]
    async fn test_pool_sized_from_options() {
        let backend = RedisBackend::connect(&lazy_options()).await.unwrap();
        let status = backend.pool().status();
        assert_eq!(status.max_size, 3);
        assert_eq!(status.size, 0);

        let timeouts = backend.pool().timeouts();
        assert_eq!(timeouts.wait, Some(Duration::from_millis(1500)));
        assert_eq!(timeouts.create, Some(Duration::from_millis(1500)));
    }

    #[tokio::test]
    async fn test_closed_pool_is_a_connection_error() {
        let backend = RedisBackend::connect(&lazy_options()).await.unwrap();
        backend.close().await;
        assert!(matches!(
            backend.acquire().await,
            Err(AppError::Connection { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let options = CacheOptions {
            endpoint: "http://not-redis".to_string(),
            ..lazy_options()
        };
        assert!(matches!(
            RedisBackend::connect(&options).await,
            Err(AppError::Connection { .. })
        ));
    }
}
