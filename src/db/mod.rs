//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management with connect retries
//! - Request scopes that pin one pooled connection
//! - Declarative table definitions and DDL generation
//! - Database dispatch macros for reducing code duplication

#[macro_use]
pub mod macros;
pub mod pool;
pub mod schema;
pub mod scope;

pub use pool::{Database, DatabaseType, DbPool};
pub use schema::{ColumnDef, ColumnType, TableDef};
pub use scope::RequestScope;
