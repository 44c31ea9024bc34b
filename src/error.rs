//! Error types for the region data layer.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Failures from the database and cache clients are converted into [`AppError`]
//! without changing their meaning; nothing here retries or recovers.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "23505" for unique violation
        sql_state: Option<String>,
    },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Timeout: {operation}{}", limit_suffix(.limit))]
    Timeout {
        operation: String,
        /// Configured limit, when the failing layer knows it.
        limit: Option<Duration>,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a timeout error for an operation bounded by `limit`.
    pub fn timeout(operation: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit: Some(limit),
        }
    }

    /// Create a timeout error reported by a client that does not expose its limit.
    pub fn timed_out(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit: None,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// SQLSTATE reported by the database, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Database { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

fn limit_suffix(limit: &Option<Duration>) -> String {
    match limit {
        Some(limit) => format!(" exceeded {:?}", limit),
        None => " timed out".to_string(),
    }
}

/// Convert sqlx errors to AppError.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => AppError::connection(
                msg.to_string(),
                "Check the DSN format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AppError::database(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => AppError::database("No rows returned", None),
            sqlx::Error::PoolTimedOut => AppError::timed_out("connection pool acquire"),
            sqlx::Error::PoolClosed => {
                AppError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => AppError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => AppError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration or build with the tls-native / tls-rustls feature",
            ),
            sqlx::Error::Protocol(msg) => AppError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                AppError::database(format!("Column not found: {}", col), None)
            }
            sqlx::Error::ColumnDecode { index, source } => {
                AppError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => AppError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => AppError::internal("Database worker crashed"),
            _ => AppError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Convert redis errors to AppError.
impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            return AppError::timed_out("cache operation");
        }
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            return AppError::connection(
                format!("Cache connection error: {}", err),
                "Check that the cache server is running and CACHE_ENDPOINT / CACHE_PORT are correct",
            );
        }
        AppError::cache(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for AppError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        AppError::serialization(format!("MessagePack encode: {}", err))
    }
}

impl From<rmp_serde::decode::Error> for AppError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        AppError::serialization(format!("MessagePack decode: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::serialization(format!("JSON: {}", err))
    }
}

/// Result type alias for data layer operations.
pub type AppResult<T> = Result<T, AppError>;
