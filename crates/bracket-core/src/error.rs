//! The BFF's error taxonomy (spec §7).
//!
//! Every fallible operation in the core eventually resolves to one of
//! these seven kinds. Cache faults are recovered locally wherever
//! possible; the rest cross the HTTP boundary via `bracket-server`'s
//! `ApiError`.

use thiserror::Error;

/// Convenience alias used throughout the core.
pub type BffResult<T> = Result<T, BffError>;

/// The seven error kinds named by spec §7.
#[derive(Debug, Error, Clone)]
pub enum BffError {
    /// Malformed slug, unknown route. Surfaced immediately as 4xx.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream reports the tournament does not exist. 404, not cached.
    #[error("tournament not found: {0}")]
    NotFound(String),

    /// Upstream 429 exhausting the retry budget. 503-class, not cached.
    #[error("rate limited by upstream")]
    RateLimited,

    /// Upstream 5xx or a network failure. 503-class, not cached.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Missing or invalid credentials. 500-class; startup emits a
    /// fatal log when this is detected at boot.
    #[error("fatal configuration error: {0}")]
    FatalConfiguration(String),

    /// A cache backend raised a fault. Recovered locally wherever the
    /// caller has a fallback (the composite falls through to the next
    /// backend on reads; writes tolerate partial failure).
    #[error("cache fault: {0}")]
    CacheFault(String),

    /// An unexpected condition in the core. 500-class with a redacted
    /// message; must never leak the upstream bearer credential.
    #[error("internal error: {0}")]
    Bug(String),
}

impl BffError {
    /// Whether this error class is cacheable as a negative result.
    ///
    /// None of the BFF's error kinds are cached — every surfaced
    /// error is re-attempted on the next read.
    #[must_use]
    pub const fn is_cacheable(&self) -> bool {
        false
    }
}
