//! Error types for the store, the task cache and token handling

use std::time::Duration;
use thiserror::Error;

/// Failures of the durable store.
///
/// Everything except the lookup variants means the request could not be
/// served and should surface as an internal error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Task {0} not found")]
    TaskNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Login already taken: {0}")]
    LoginTaken(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Database unreachable after {attempts} attempts: {source}")]
    Unavailable {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<taskboard_types::UnknownSortColumn> for StoreError {
    fn from(e: taskboard_types::UnknownSortColumn) -> Self {
        StoreError::InvalidQuery(e.to_string())
    }
}

/// Failures of the task cache.
///
/// None of these ever reach a client; the coordinator logs them and falls
/// back to the store.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Task {0} not in cache")]
    NotFound(i64),

    #[error("Task {0} already in cache")]
    AlreadyExists(i64),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Misses and populate races are normal outcomes, not backend trouble.
    pub fn is_benign(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::AlreadyExists(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Corrupt(e.to_string())
    }
}

/// Failures of registration, login and token validation
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Failed to issue token: {0}")]
    Encode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_cache_errors() {
        assert!(CacheError::NotFound(1).is_benign());
        assert!(CacheError::AlreadyExists(1).is_benign());
        assert!(!CacheError::Timeout(Duration::from_millis(5)).is_benign());
        assert!(!CacheError::Backend("down".into()).is_benign());
    }

    #[test]
    fn test_unknown_sort_column_is_invalid_query() {
        let err: StoreError = taskboard_types::UnknownSortColumn("drop".into()).into();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }
}
