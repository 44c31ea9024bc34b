//! Table-mapped models.

pub mod region;

pub use region::{
    REGIONS_KEY, Region, RegionInfo, RegionsDict, get_regions_dict, invalidate_regions_dict,
    regions_dict,
};

use crate::db::TableDef;

/// Every mapped table, in creation order.
pub const MAPPED_TABLES: &[&TableDef] = &[&Region::TABLE];
