//! Error types for thread-relay.

use std::time::Duration;

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Source feed errors.
///
/// Always recoverable: the current sweep sees an empty batch and the
/// next sweep retries. Never fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Feed returned HTTP {status}")]
    Status { status: u16 },

    #[error("Feed content type is not JSON: {0}")]
    ContentType(String),

    #[error("Feed body is not valid JSON: {0}")]
    Parse(String),

    #[error("Feed shape not recognized: {0}")]
    Shape(String),
}

/// Dedup store errors. A failing store aborts the whole sweep — delivering
/// without a working dedup record risks duplicate posts.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open dedup store: {0}")]
    Open(String),

    #[error("Dedup query failed: {0}")]
    Query(String),
}

/// Per-attachment image errors. The attachment is dropped; the post
/// itself is still delivered.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Sink delivery errors, classified for the retry policy.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Sink throttled, retry after {retry_after:?}")]
    Throttled { retry_after: Duration },

    #[error("Transient sink failure: {0}")]
    TransientTimeout(String),

    #[error("Sink rejected the message: {reason}")]
    PermanentRejected { reason: String },
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
