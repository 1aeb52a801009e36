//! Cache-facing value types and the backend contract (spec §3, §4.1).

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MatchCounts, Tournament};

/// A cache operation fault, distinguishable from a clean miss.
#[derive(Debug, Error, Clone)]
pub enum CacheError {
    /// `ttl_seconds <= 0` was passed to `set`.
    #[error("invalid ttl: must be a positive number of seconds")]
    InvalidTtl,
    /// The backend is unreachable or the connection is broken.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    /// Any other backend-specific fault (serialization, protocol error).
    #[error("cache backend fault: {0}")]
    Fault(String),
}

/// An entry as stored by a single backend.
///
/// Invariant: `expires_at > created_at`, enforced by [`CacheEntry::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key.
    pub key: String,
    /// The stored value, as an opaque JSON document.
    pub value: serde_json::Value,
    /// When this entry was written.
    pub created_at: SystemTime,
    /// When this entry stops being valid.
    pub expires_at: SystemTime,
}

impl CacheEntry {
    /// Construct an entry, rejecting non-positive TTLs at the same
    /// point spec §4.1 calls out as a caller error.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidTtl`] if `ttl_seconds <= 0`.
    pub fn new(
        key: impl Into<String>,
        value: serde_json::Value,
        ttl_seconds: i64,
    ) -> Result<Self, CacheError> {
        if ttl_seconds <= 0 {
            return Err(CacheError::InvalidTtl);
        }
        let created_at = SystemTime::now();
        let expires_at = created_at + Duration::from_secs(ttl_seconds.unsigned_abs());
        Ok(Self {
            key: key.into(),
            value,
            created_at,
            expires_at,
        })
    }

    /// Whether this entry has expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    /// Remaining seconds of freshness as of `now`, or `0` if expired.
    #[must_use]
    pub fn ttl_remaining(&self, now: SystemTime) -> i64 {
        self.expires_at
            .duration_since(now)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A value returned by a successful cache `get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedValue {
    /// The stored document.
    pub value: serde_json::Value,
    /// When it was written.
    pub created_at: SystemTime,
    /// When it expires.
    pub expires_at: SystemTime,
}

/// Freshness metadata derived from a live entry; never itself persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    /// The cache key this metadata describes.
    pub key: String,
    /// Remaining seconds of freshness.
    pub ttl_seconds: i64,
    /// When the entry was written.
    pub created_at: SystemTime,
    /// When the entry expires.
    pub expires_at: SystemTime,
}

/// Metadata attached to a tournament response (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// When the served value was cached, if it was.
    pub cached_at: Option<SystemTime>,
    /// Remaining TTL seconds, if the value came from (or was just
    /// written to) the cache.
    pub ttl: Option<i64>,
    /// Whether any `current_matches` entry is `in_progress`.
    pub has_ongoing_matches: bool,
    /// Whether any `current_matches` entry completed within 300s.
    pub has_recent_matches: bool,
    /// The counts feeding the TTL decision.
    pub counts: MatchCounts,
}

/// The full response shape served to clients (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResponse {
    /// The tournament payload.
    pub data: Tournament,
    /// Whether this response was served from cache without a fetch.
    pub cached: bool,
    /// Freshness metadata.
    pub metadata: ResponseMetadata,
}

/// The cache backend contract shared by C1 (in-memory), C2 (remote),
/// and C3 (composite) — spec §4.1.
///
/// `get` returning `Ok(None)` covers both "absent" and "expired":
/// expired entries are never resurrected. An `Err` return is a
/// transient fault, distinguishable from a clean miss.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Read a value. `Ok(None)` means absent or expired.
    async fn get(&self, key: &str) -> Result<Option<CachedValue>, CacheError>;

    /// Write a value, overwriting any existing entry. Never merges.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidTtl`] if `ttl_seconds <= 0`.
    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl_seconds: i64,
    ) -> Result<(), CacheError>;

    /// Delete a key. Absent keys succeed silently.
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Whether a live (non-expired) entry exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Freshness metadata for a live entry, or `Ok(None)`.
    async fn get_metadata(&self, key: &str) -> Result<Option<CacheMetadata>, CacheError>;

    /// Remove every entry this backend owns.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Release any held resources (background tasks, connections).
    async fn close(&self);

    /// A short identifier for logging and composite naming.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_ttl() {
        let err = CacheEntry::new("k", serde_json::json!({"a": 1}), 0).unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl));
        let err = CacheEntry::new("k", serde_json::json!({"a": 1}), -5).unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl));
    }

    #[test]
    fn expires_at_is_after_created_at() {
        let entry = CacheEntry::new("k", serde_json::json!(1), 10).unwrap();
        assert!(entry.expires_at > entry.created_at);
    }

    #[test]
    fn ttl_remaining_hits_zero_after_expiry() {
        let entry = CacheEntry::new("k", serde_json::json!(1), 1).unwrap();
        assert!(entry.ttl_remaining(entry.created_at) > 0);
        let far_future = entry.expires_at + Duration::from_secs(5);
        assert_eq!(entry.ttl_remaining(far_future), 0);
    }
}
