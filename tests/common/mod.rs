//! Shared fixtures for integration tests.

#![allow(dead_code)]

use region_data::cache::{Cache, Serializer};
use region_data::config::DatabaseOptions;
use region_data::db::Database;
use region_data::models::MAPPED_TABLES;
use region_data::state::AppState;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Options for a small pool on a SQLite file.
pub fn sqlite_options(file: &NamedTempFile) -> DatabaseOptions {
    let path = file.path().to_str().unwrap();
    let mut options = DatabaseOptions::new(format!("sqlite:{}", path));
    options.pool_min_size = 1;
    options.pool_max_size = 2;
    options.retry_interval = Duration::from_millis(10);
    options
}

/// Connected database with the mapped tables created.
pub async fn sqlite_database(file: &NamedTempFile) -> Database {
    let db = Database::connect(sqlite_options(file)).await.unwrap();
    db.create_all(MAPPED_TABLES).await.unwrap();
    db
}

/// Data layer state over a SQLite file and an in-process cache.
pub async fn memory_state(file: &NamedTempFile, serializer: Serializer) -> AppState {
    let db = sqlite_database(file).await;
    AppState::new(db, Cache::memory(serializer), None)
}

pub async fn insert_region(db: &Database, id: i16, name: &str, lat: f64, lon: f64) {
    db.execute(&format!(
        "INSERT INTO regions (region_id, region_name, latitude, longitude) VALUES ({}, '{}', {:?}, {:?})",
        id, name, lat, lon
    ))
    .await
    .unwrap();
}
