//! Core error types for the Flexfolio application.
//!
//! This module defines database-agnostic error types. Storage-specific
//! errors (from Diesel, SQLite, etc.) are converted to these types by the
//! storage layer.

use thiserror::Error;

use crate::flex::{FlexError, ParseError};

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio application.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Flex fetch failed: {0}")]
    Flex(#[from] FlexError),

    #[error("Statement parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Flex credentials not set for holder {0}")]
    CredentialsMissing(String),

    #[error("Secret store error: {0}")]
    Secret(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Machine-actionable hint for the API layer, when one applies.
    ///
    /// Token expiry is the one failure the caller can fix on their own, so
    /// it gets a dedicated hint instead of a generic error message.
    pub fn needs_action(&self) -> Option<&'static str> {
        match self {
            Error::Flex(e) if e.is_token_expired() => Some("RENEW_FLEX_TOKEN"),
            _ => None,
        }
    }
}

/// Database-agnostic error type for storage operations.
///
/// Uses `String` for all error details so the storage layer can convert
/// storage-specific errors into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DatabaseError {
    /// True when the failure is a missing relation (migrations not applied
    /// yet). Best-effort persistence paths downgrade these to no-ops.
    pub fn is_missing_relation(&self) -> bool {
        match self {
            DatabaseError::QueryFailed(msg) | DatabaseError::Internal(msg) => {
                msg.contains("no such table")
            }
            _ => false,
        }
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
