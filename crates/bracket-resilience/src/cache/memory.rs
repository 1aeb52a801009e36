//! In-memory cache backend (C1, spec §4.1).

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bracket_core::cache::{CacheBackend, CacheError, CacheMetadata, CachedValue};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: serde_json::Value,
    created_at: SystemTime,
    expires_at: SystemTime,
}

impl Entry {
    fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

/// A concurrent in-memory cache backend with a periodic expiry sweep.
///
/// Keeps a flat `DashMap` keyspace (the sharded-lock shape the pack's
/// cache-focused repos prefer for this access pattern) rather than a
/// single `RwLock<HashMap<..>>` guarding the whole map.
pub struct MemoryCacheBackend {
    entries: Arc<DashMap<String, Entry>>,
    sweep_handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl MemoryCacheBackend {
    /// Build a backend with the default sweep interval (300s).
    #[must_use]
    pub fn new() -> Self {
        Self::with_sweep_interval(Duration::from_secs(300))
    }

    /// Build a backend with an explicit sweep interval.
    #[must_use]
    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        let entries: Arc<DashMap<String, Entry>> = Arc::new(DashMap::new());
        let sweep_entries = Arc::clone(&entries);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                let now = SystemTime::now();
                let before = sweep_entries.len();
                sweep_entries.retain(|_, entry| !entry.is_expired_at(now));
                let removed = before - sweep_entries.len();
                if removed > 0 {
                    debug!(removed, "memory cache sweep removed expired entries");
                }
            }
        });

        Self {
            entries,
            sweep_handle: parking_lot::Mutex::new(Some(handle)),
        }
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<CachedValue>, CacheError> {
        let now = SystemTime::now();
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        if entry.is_expired_at(now) {
            drop(entry);
            self.entries.remove(key);
            return Ok(None);
        }
        Ok(Some(CachedValue {
            value: entry.value.clone(),
            created_at: entry.created_at,
            expires_at: entry.expires_at,
        }))
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl_seconds: i64,
    ) -> Result<(), CacheError> {
        if ttl_seconds <= 0 {
            return Err(CacheError::InvalidTtl);
        }
        let created_at = SystemTime::now();
        let expires_at = created_at + Duration::from_secs(ttl_seconds.unsigned_abs());
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                created_at,
                expires_at,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let now = SystemTime::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => Ok(true),
            Some(entry) => {
                drop(entry);
                self.entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<CacheMetadata>, CacheError> {
        let now = SystemTime::now();
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        if entry.is_expired_at(now) {
            drop(entry);
            self.entries.remove(key);
            return Ok(None);
        }
        let ttl_seconds = entry
            .expires_at
            .duration_since(now)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Ok(Some(CacheMetadata {
            key: key.to_string(),
            ttl_seconds,
            created_at: entry.created_at,
            expires_at: entry.expires_at,
        }))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }

    async fn close(&self) {
        if let Some(handle) = self.sweep_handle.lock().take() {
            handle.abort();
        }
        self.entries.clear();
    }

    fn name(&self) -> &str {
        "memory"
    }
}
