//! Region model and the cached region lookup.

use crate::cache::CacheKey;
use crate::db::{ColumnDef, ColumnType, RequestScope, TableDef};
use crate::error::AppResult;
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Cache address of the whole-table region snapshot.
pub const REGIONS_KEY: CacheKey = CacheKey::new("regions", "dict");

/// A row of the `regions` table. Rows are maintained outside this crate; there is no write path.
///
/// Only the key is constrained, so any other column may be NULL.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Region {
    pub region_id: i16,
    pub region_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Region {
    pub const TABLE: TableDef = TableDef {
        name: "regions",
        columns: &[
            ColumnDef::new("region_id", ColumnType::SmallInt).primary_key(),
            ColumnDef::new("region_name", ColumnType::Text),
            ColumnDef::new("latitude", ColumnType::Float),
            ColumnDef::new("longitude", ColumnType::Float),
        ],
    };

    /// Load every region row.
    pub async fn all(scope: &mut RequestScope<'_>) -> AppResult<Vec<Region>> {
        scope.fetch_all(&Self::TABLE.select_all_sql()).await
    }

    /// Split into the id and the `(name, latitude, longitude)` value.
    pub fn into_entry(self) -> (i16, RegionInfo) {
        (
            self.region_id,
            RegionInfo {
                name: self.region_name,
                latitude: self.latitude,
                longitude: self.longitude,
            },
        )
    }
}

/// Name and coordinates of a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<RegionInfo> for (Option<String>, Option<f64>, Option<f64>) {
    fn from(info: RegionInfo) -> Self {
        (info.name, info.latitude, info.longitude)
    }
}

/// Region id to name and coordinates.
pub type RegionsDict = BTreeMap<i16, RegionInfo>;

/// Reshape rows into the id-keyed mapping.
pub fn regions_dict(rows: impl IntoIterator<Item = Region>) -> RegionsDict {
    rows.into_iter().map(Region::into_entry).collect()
}

/// Every region keyed by id, read through the cache.
///
/// On a miss the table is loaded, reshaped and stored under [`REGIONS_KEY`]
/// (with the configured TTL, if any). Concurrent misses may each hit the
/// database; the last write wins.
pub async fn get_regions_dict(state: &AppState) -> AppResult<RegionsDict> {
    state
        .cache
        .get_or_insert_with(&REGIONS_KEY, state.regions_ttl, move || async move {
            let mut scope = state.db.request_scope();
            let rows = Region::all(&mut scope).await?;
            info!(count = rows.len(), "Loaded regions from database");
            Ok(regions_dict(rows))
        })
        .await
}

/// Drop the cached snapshot so the next lookup reloads it. Returns whether an entry existed.
pub async fn invalidate_regions_dict(state: &AppState) -> AppResult<bool> {
    let removed = state.cache.delete(&REGIONS_KEY).await?;
    info!(key = %REGIONS_KEY, removed, "Invalidated cached regions");
    Ok(removed)
}
