//! Request-scoped database access.
//!
//! When `use_connection_for_request` is enabled, a [`RequestScope`] acquires one
//! connection from the pool on its first query and reuses it for every later
//! query in the scope. The connection goes back to the pool when the scope is
//! dropped. When disabled, each query is sent straight to the pool.

use crate::db::pool::Database;
use crate::error::AppResult;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Postgres, Sqlite};
use tracing::debug;

/// A connection pinned for the lifetime of a scope.
#[derive(Debug)]
pub enum ScopedConnection {
    Postgres(PoolConnection<Postgres>),
    SQLite(PoolConnection<Sqlite>),
}

#[derive(Debug)]
pub struct RequestScope<'a> {
    db: &'a Database,
    conn: Option<ScopedConnection>,
}

impl<'a> RequestScope<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db, conn: None }
    }

    pub fn database(&self) -> &'a Database {
        self.db
    }

    /// Whether a connection is currently held by this scope.
    pub fn is_pinned(&self) -> bool {
        self.conn.is_some()
    }

    /// Run a query and map every row into `T`.
    pub async fn fetch_all<T>(&mut self, sql: &str) -> AppResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        if !self.db.uses_connection_for_request() {
            return self.db.fetch_all(sql).await;
        }

        let db = self.db;
        let conn = self.connection().await?;
        debug!(sql = %sql, "Fetching rows on scoped connection");
        let rows = impl_conn_dispatch!(conn, {
            Postgres(c) => sqlx::query_as::<_, T>(sql).fetch_all(&mut **c).await.map_err(|e| db.sql_error(e))?,
            SQLite(c) => sqlx::query_as::<_, T>(sql).fetch_all(&mut **c).await.map_err(|e| db.sql_error(e))?,
        });
        Ok(rows)
    }

    /// Execute a statement and return the affected row count.
    pub async fn execute(&mut self, sql: &str) -> AppResult<u64> {
        if !self.db.uses_connection_for_request() {
            return self.db.execute(sql).await;
        }

        let db = self.db;
        let conn = self.connection().await?;
        debug!(sql = %sql, "Executing statement on scoped connection");
        let affected = impl_conn_dispatch!(conn, {
            Postgres(c) => sqlx::query(sql).execute(&mut **c).await.map_err(|e| db.sql_error(e))?.rows_affected(),
            SQLite(c) => sqlx::query(sql).execute(&mut **c).await.map_err(|e| db.sql_error(e))?.rows_affected(),
        });
        Ok(affected)
    }

    /// The pinned connection, acquiring it on first use.
    async fn connection(&mut self) -> AppResult<&mut ScopedConnection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                debug!("Pinning pooled connection for request scope");
                let db = self.db;
                impl_db_dispatch!(db.pool(), {
                    Postgres(p) => ScopedConnection::Postgres(p.acquire().await.map_err(|e| db.sql_error(e))?),
                    SQLite(p) => ScopedConnection::SQLite(p.acquire().await.map_err(|e| db.sql_error(e))?),
                })
            }
        };
        Ok(self.conn.insert(conn))
    }
}
