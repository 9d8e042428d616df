//! Error types shared by the remote client, the movie store and the catalog.

use thiserror::Error;

use crate::cache::CacheError;

/// Errors produced while reading from the remote movie API
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered 429 Too Many Requests
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Transport failure, including timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response other than 429
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Body could not be parsed as the expected JSON
    #[error("Failed to parse API response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Response parsed but lacks the expected payload
    #[error("Missing expected field in response: {0}")]
    UpstreamDataMissing(String),

    /// Every allowed attempt failed
    #[error("Upstream unavailable after {attempts} attempt(s)")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether this failure is the upstream's explicit too-many-requests signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }

    /// Whether another attempt may succeed.
    ///
    /// Missing payloads and already-exhausted errors are final.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            FetchError::UpstreamDataMissing(_) | FetchError::Exhausted { .. }
        )
    }
}

/// Errors produced by the persisted movie store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Movie store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Movie store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse movie store response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Both the remote API and the fallback store failed
    #[error("Failed to connect to the movie API ({upstream}) and the movie store ({store})")]
    Unavailable {
        upstream: FetchError,
        store: StoreError,
    },

    #[error("Movie not found: {0}")]
    NotFound(u64),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Renders an error followed by its chain of causes, separated by `: `.
///
/// A cause whose text already appears in the message is skipped.
pub fn report(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
