use thiserror::Error;

/// Failure taxonomy for aggregator operations.
///
/// Nothing retries on its own: every failure is a single attempt, either
/// surfaced here or logged and skipped where the component contract says so.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network, timeout, or remote-service failure.
    #[error("remote request failed: {0}")]
    Transient(anyhow::Error),

    /// The named channel or subscription is not known.
    #[error("{0}")]
    NotFound(String),

    /// Rejected before any remote or persisted state changed.
    #[error("{0}")]
    Validation(String),

    /// A local write failed, possibly after an in-memory change already
    /// applied.
    #[error("persistence failure: {0}")]
    Persistence(anyhow::Error),
}

impl FeedError {
    pub fn transient(err: impl Into<anyhow::Error>) -> Self {
        Self::Transient(err.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn persistence(err: impl Into<anyhow::Error>) -> Self {
        Self::Persistence(err.into())
    }
}
