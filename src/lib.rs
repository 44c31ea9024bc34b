//! Region data layer.
//!
//! This library wires a pooled relational database connection and a distributed
//! cache, and exposes the cached region lookup built on top of them.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;

pub use cache::Cache;
pub use config::Config;
pub use db::Database;
pub use error::{AppError, AppResult};
pub use models::{RegionsDict, get_regions_dict, invalidate_regions_dict};
pub use state::AppState;
