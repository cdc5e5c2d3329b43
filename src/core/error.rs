//! Error types for Arkalia sync.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`ProgressionSource`](super::ProgressionSource).
///
/// All variants are recoverable from the agent's point of view: they feed the
/// retry budget and are never propagated to the page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The request could not be sent or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The body was not a usable progression envelope.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The fetch did not complete in time.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors in the sync layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Operation requires a snapshot but none has been received yet.
    #[error("no progression snapshot yet")]
    NotInitialized,

    /// Source error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Errors from client-side storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A value was parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by an update callback. Logged, never propagated.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level Arkalia errors.
#[derive(Debug, Error)]
pub enum ArkaliaError {
    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Source error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
