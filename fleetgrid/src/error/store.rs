//! Preference store error types

use thiserror::Error;

/// Failure while talking to a preference backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
