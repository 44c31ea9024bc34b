//! Database dispatch macros for reducing code duplication.
//!
//! The pool and pinned-connection types are enums over the supported backends;
//! these macros generate the repetitive match arms while keeping each arm's body
//! visible at the call site.

/// Macro for generating database dispatch match arms over `DbPool`.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     Postgres(p) => do_postgres(p),
///     SQLite(p) => do_sqlite(p),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

/// Same as [`impl_db_dispatch`] for a connection pinned by a request scope.
#[macro_export]
macro_rules! impl_conn_dispatch {
    ($conn:expr, { $($variant:ident($c:ident) => $body:expr),+ $(,)? }) => {
        match $conn {
            $(
                $crate::db::scope::ScopedConnection::$variant($c) => $body,
            )+
        }
    };
}

pub use impl_conn_dispatch;
pub use impl_db_dispatch;
