//! Process-wide data layer state.
//!
//! [`AppState`] is built once on startup, handed to whatever consumes the data
//! layer, and torn down explicitly on shutdown.

use crate::cache::Cache;
use crate::config::Config;
use crate::db::Database;
use crate::error::AppResult;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub cache: Cache,
    /// Lifetime of the cached region mapping. `None` keeps it until evicted.
    pub regions_ttl: Option<Duration>,
}

impl AppState {
    pub fn new(db: Database, cache: Cache, regions_ttl: Option<Duration>) -> Self {
        Self {
            db,
            cache,
            regions_ttl,
        }
    }

    /// Connect the database and the cache described by `config`.
    ///
    /// A database that stays unreachable after the retry policy is a fatal startup error.
    pub async fn init(config: &Config) -> AppResult<Self> {
        let db = Database::connect(config.database_options()).await?;
        let cache = match Cache::connect(&config.cache_options()).await {
            Ok(cache) => cache,
            Err(e) => {
                db.close().await;
                return Err(e);
            }
        };
        info!(
            db_type = %db.db_type(),
            cache_backend = cache.backend().name(),
            serializer = %cache.serializer(),
            "Data layer initialized"
        );
        Ok(Self::new(db, cache, config.regions_ttl()))
    }

    /// Close cache and database connections.
    pub async fn shutdown(&self) {
        self.cache.close().await;
        self.db.close().await;
        info!("Data layer shut down");
    }
}
