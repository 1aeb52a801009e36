//! Upstream error taxonomy (spec §4.3, §7).

use bracket_core::error::BffError;
use bracket_resilience::Retryable;
use thiserror::Error;

/// Errors surfaced by the upstream GraphQL client.
#[derive(Debug, Error, Clone)]
pub enum UpstreamError {
    /// HTTP 429 or equivalent, retried up to `max_retries` times
    /// before surfacing.
    #[error("rate limited by upstream")]
    RateLimited,

    /// HTTP 401. Classified as fatal-configuration and never retried.
    #[error("upstream authentication failed")]
    AuthenticationFailed,

    /// The requested tournament does not exist upstream.
    #[error("tournament not found: {0}")]
    NotFound(String),

    /// HTTP 5xx from upstream.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// A malformed or unexpected response body.
    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    /// The request's deadline (spec §5) passed before it could be
    /// dispatched, or while it was waiting out a retry backoff.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl Retryable for UpstreamError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl From<UpstreamError> for BffError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotFound(msg) => Self::NotFound(msg),
            UpstreamError::RateLimited => Self::RateLimited,
            UpstreamError::UpstreamUnavailable(msg) => Self::UpstreamUnavailable(msg),
            UpstreamError::Network(msg) => Self::UpstreamUnavailable(msg),
            UpstreamError::AuthenticationFailed => {
                Self::FatalConfiguration("upstream bearer token was rejected".to_string())
            }
            UpstreamError::Decode(msg) => Self::Bug(msg),
            UpstreamError::DeadlineExceeded => {
                Self::UpstreamUnavailable("request deadline exceeded".to_string())
            }
        }
    }
}
