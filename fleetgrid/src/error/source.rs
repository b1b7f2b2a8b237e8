//! Data source error types

use thiserror::Error;

/// Failure reported by a [`RangeSource`](crate::window::RangeSource).
///
/// The windowed renderer never retries on its own; a failed page stays
/// unloaded until something requests it again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The backend answered with an error.
    #[error("data source failed: {message}")]
    Failed { message: String },
    /// The backend could not be reached.
    #[error("data source unavailable")]
    Unavailable,
}

impl SourceError {
    /// Creates a [`SourceError::Failed`] with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
