//! Integration tests for the cached region lookup.

mod common;

use common::{insert_region, memory_state, sqlite_database};
use region_data::cache::{Cache, Serializer};
use region_data::error::AppError;
use region_data::models::{
    REGIONS_KEY, Region, RegionInfo, RegionsDict, get_regions_dict, invalidate_regions_dict,
};
use region_data::state::AppState;
use tempfile::NamedTempFile;

fn info(name: &str, latitude: f64, longitude: f64) -> RegionInfo {
    RegionInfo {
        name: Some(name.to_string()),
        latitude: Some(latitude),
        longitude: Some(longitude),
    }
}

#[tokio::test]
async fn test_regions_dict_maps_id_to_name_and_coordinates() {
    let file = NamedTempFile::new().unwrap();
    let state = memory_state(&file, Serializer::MessagePack).await;
    insert_region(&state.db, 1, "A", 1.0, 2.0).await;
    insert_region(&state.db, 2, "B", 3.0, 4.0).await;

    let regions = get_regions_dict(&state).await.unwrap();

    let mut expected = RegionsDict::new();
    expected.insert(1, info("A", 1.0, 2.0));
    expected.insert(2, info("B", 3.0, 4.0));
    assert_eq!(regions, expected);
}

#[tokio::test]
async fn test_second_call_does_not_touch_database() {
    let file = NamedTempFile::new().unwrap();
    let state = memory_state(&file, Serializer::MessagePack).await;
    insert_region(&state.db, 1, "A", 1.0, 2.0).await;

    let first = get_regions_dict(&state).await.unwrap();

    // Any database access after this point would fail
    state.db.execute("DROP TABLE regions").await.unwrap();

    let second = get_regions_dict(&state).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_table_returns_and_caches_empty_mapping() {
    let file = NamedTempFile::new().unwrap();
    let state = memory_state(&file, Serializer::MessagePack).await;

    let regions = get_regions_dict(&state).await.unwrap();
    assert!(regions.is_empty());
    assert!(state.cache.exists(&REGIONS_KEY).await.unwrap());

    // Cached empty snapshot is served even after rows appear
    insert_region(&state.db, 5, "Late", 0.5, 0.5).await;
    assert!(get_regions_dict(&state).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalidate_forces_reload() {
    let file = NamedTempFile::new().unwrap();
    let state = memory_state(&file, Serializer::Json).await;
    insert_region(&state.db, 1, "A", 1.0, 2.0).await;

    assert_eq!(get_regions_dict(&state).await.unwrap().len(), 1);

    insert_region(&state.db, 2, "B", 3.0, 4.0).await;
    assert_eq!(get_regions_dict(&state).await.unwrap().len(), 1);

    assert!(invalidate_regions_dict(&state).await.unwrap());
    assert!(!invalidate_regions_dict(&state).await.unwrap());

    let reloaded = get_regions_dict(&state).await.unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[&2], info("B", 3.0, 4.0));
}

#[tokio::test]
async fn test_null_columns_stay_absent() {
    let file = NamedTempFile::new().unwrap();
    let state = memory_state(&file, Serializer::MessagePack).await;
    insert_region(&state.db, 1, "A", 1.0, 2.0).await;
    state
        .db
        .execute(
            "INSERT INTO regions (region_id, region_name, latitude, longitude) \
             VALUES (2, NULL, 3.0, NULL)",
        )
        .await
        .unwrap();

    let regions = get_regions_dict(&state).await.unwrap();
    assert_eq!(regions[&1], info("A", 1.0, 2.0));
    assert_eq!(
        regions[&2],
        RegionInfo {
            name: None,
            latitude: Some(3.0),
            longitude: None,
        }
    );

    // Served from the cache with the gaps intact
    state.db.execute("DROP TABLE regions").await.unwrap();
    assert_eq!(get_regions_dict(&state).await.unwrap(), regions);
}

#[tokio::test]
async fn test_duplicate_region_id_rejected() {
    let file = NamedTempFile::new().unwrap();
    let db = sqlite_database(&file).await;
    insert_region(&db, 1, "A", 1.0, 2.0).await;

    let result = db
        .execute(
            "INSERT INTO regions (region_id, region_name, latitude, longitude) \
             VALUES (1, 'Again', 0.0, 0.0)",
        )
        .await;

    match result {
        Err(err @ AppError::Database { .. }) => assert!(err.sql_state().is_some()),
        other => panic!("expected primary key violation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_without_pinned_connection() {
    let file = NamedTempFile::new().unwrap();
    let mut options = common::sqlite_options(&file);
    options.use_connection_for_request = false;
    let db = region_data::db::Database::connect(options).await.unwrap();
    db.create_all(region_data::models::MAPPED_TABLES).await.unwrap();
    insert_region(&db, 9, "Valley", 34.2, -118.5).await;

    let state = AppState::new(db, Cache::memory(Serializer::MessagePack), None);
    let regions = get_regions_dict(&state).await.unwrap();
    assert_eq!(regions[&9].name.as_deref(), Some("Valley"));
}

#[tokio::test]
async fn test_region_rows_load_in_a_request_scope() {
    let file = NamedTempFile::new().unwrap();
    let db = sqlite_database(&file).await;
    insert_region(&db, 3, "Harbor", 33.74, -118.28).await;

    let mut scope = db.request_scope();
    let rows = Region::all(&mut scope).await.unwrap();
    assert!(scope.is_pinned());
    assert_eq!(
        rows,
        vec![Region {
            region_id: 3,
            region_name: Some("Harbor".to_string()),
            latitude: Some(33.74),
            longitude: Some(-118.28),
        }]
    );
}

#[tokio::test]
async fn test_shutdown_closes_database() {
    let file = NamedTempFile::new().unwrap();
    let state = memory_state(&file, Serializer::MessagePack).await;
    state.shutdown().await;
    assert!(state.db.pool().is_closed());
    assert!(matches!(
        get_regions_dict(&state).await,
        Err(AppError::Connection { .. })
    ));
}
