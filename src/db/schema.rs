//! Declarative table definitions.
//!
//! Mapped models describe their table once as a [`TableDef`]; the DDL for each
//! backend is generated from it.

use crate::db::pool::DatabaseType;

/// Logical column types used by mapped tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    SmallInt,
    Text,
    /// Double precision float; decodes as `f64` on every backend.
    Float,
}

impl ColumnType {
    pub fn sql(&self, db_type: DatabaseType) -> &'static str {
        match (self, db_type) {
            (Self::SmallInt, _) => "SMALLINT",
            (Self::Text, _) => "TEXT",
            // Postgres REAL is float4, which does not decode into f64
            (Self::Float, DatabaseType::PostgreSQL) => "DOUBLE PRECISION",
            (Self::Float, DatabaseType::SQLite) => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub nullable: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            primary_key: false,
            nullable: true,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    fn sql(&self, db_type: DatabaseType) -> String {
        let mut sql = format!("{} {}", self.name, self.column_type.sql(db_type));
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// Comma-separated column list, in declaration order.
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SELECT` every column of every row.
    pub fn select_all_sql(&self) -> String {
        format!("SELECT {} FROM {}", self.column_list(), self.name)
    }

    pub fn create_sql(&self, db_type: DatabaseType) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| c.sql(db_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, columns)
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }
}
