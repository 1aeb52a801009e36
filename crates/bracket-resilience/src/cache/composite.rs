//! Composite cache (C3, spec §4.2): an ordered, non-empty chain of
//! backends with read-fallback, write-through, and fire-and-forget
//! promotion.

use std::sync::Arc;

use async_trait::async_trait;
use bracket_core::cache::{CacheBackend, CacheError, CacheMetadata, CachedValue};
use futures::future::join_all;
use tracing::{debug, warn};

/// An ordered chain of cache backends, most-preferred first.
///
/// Reads fall through the chain until a hit; faulted backends are
/// logged and skipped. Writes and deletes fan out to every backend in
/// parallel; a write is reported as successful if at least one backend
/// accepted it (availability over strict coherence — spec §9's open
/// question is resolved in favor of this, the source's original,
/// semantics).
pub struct CompositeCache {
    backends: Vec<Arc<dyn CacheBackend>>,
    name: String,
    promote_on_hit: bool,
}

impl CompositeCache {
    /// Build a composite from a non-empty, most-preferred-first list
    /// of backends.
    ///
    /// # Panics
    /// Panics if `backends` is empty — a composite with no backends
    /// is a construction error, not a runtime fault.
    #[must_use]
    pub fn new(backends: Vec<Arc<dyn CacheBackend>>) -> Self {
        Self::with_promotion(backends, false)
    }

    /// As [`Self::new`], additionally enabling promotion: on a hit at
    /// level `i > 0`, the value is asynchronously written into every
    /// more-preferred backend `B0..Bi-1` using the TTL reported by
    /// `get_metadata` at level `i`. Promotion never blocks the return
    /// of the found value and its failures are swallowed.
    #[must_use]
    pub fn with_promotion(backends: Vec<Arc<dyn CacheBackend>>, promote_on_hit: bool) -> Self {
        assert!(!backends.is_empty(), "composite cache needs at least one backend");
        let name = format!(
            "Composite({})",
            backends
                .iter()
                .map(|b| b.name())
                .collect::<Vec<_>>()
                .join(" → ")
        );
        Self {
            backends,
            name,
            promote_on_hit,
        }
    }

    fn promote(&self, key: &str, level: usize, value: serde_json::Value, ttl_seconds: i64) {
        if !self.promote_on_hit || level == 0 {
            return;
        }
        let targets: Vec<Arc<dyn CacheBackend>> = self.backends[..level].to_vec();
        let key = key.to_string();
        tokio::spawn(async move {
            for backend in targets {
                if let Err(e) = backend.set(&key, value.clone(), ttl_seconds).await {
                    debug!(backend = backend.name(), error = %e, "promotion write failed, ignoring");
                }
            }
        });
    }
}

#[async_trait]
impl CacheBackend for CompositeCache {
    async fn get(&self, key: &str) -> Result<Option<CachedValue>, CacheError> {
        for (level, backend) in self.backends.iter().enumerate() {
            match backend.get(key).await {
                Ok(Some(cached)) => {
                    let ttl_seconds = cached
                        .expires_at
                        .duration_since(std::time::SystemTime::now())
                        .map(|d| d.as_secs() as i64)
                        .unwrap_or(0);
                    if ttl_seconds > 0 {
                        self.promote(key, level, cached.value.clone(), ttl_seconds);
                    }
                    return Ok(Some(cached));
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "cache read fault, falling through");
                    continue;
                }
            }
        }
        Ok(None)
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
        let results = join_all(
            self.backends
                .iter()
                .map(|b| b.set(key, value.clone(), ttl_seconds)),
        )
        .await;

        let mut any_ok = false;
        for (backend, result) in self.backends.iter().zip(results) {
            match result {
                Ok(()) => any_ok = true,
                Err(e) => warn!(backend = backend.name(), error = %e, "composite write fault"),
            }
        }

        if any_ok {
            Ok(())
        } else {
            Err(CacheError::Fault(format!(
                "all backends failed to write key {key}"
            )))
        }
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let results = join_all(self.backends.iter().map(|b| b.del(key))).await;
        for (backend, result) in self.backends.iter().zip(results) {
            if let Err(e) = result {
                debug!(backend = backend.name(), error = %e, "composite delete fault, swallowed");
            }
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        for backend in &self.backends {
            match backend.exists(key).await {
                Ok(true) => return Ok(true),
                Ok(false) => continue,
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "cache exists fault, falling through");
                    continue;
                }
            }
        }
        Ok(false)
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<CacheMetadata>, CacheError> {
        for backend in &self.backends {
            match backend.get_metadata(key).await {
                Ok(Some(meta)) => return Ok(Some(meta)),
                Ok(None) => continue,
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "cache metadata fault, falling through");
                    continue;
                }
            }
        }
        Ok(None)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let results = join_all(self.backends.iter().map(|b| b.clear())).await;
        let mut any_ok = false;
        for (backend, result) in self.backends.iter().zip(results) {
            match result {
                Ok(()) => any_ok = true,
                Err(e) => warn!(backend = backend.name(), error = %e, "composite clear fault"),
            }
        }
        if any_ok {
            Ok(())
        } else {
            Err(CacheError::Fault("all backends failed to clear".to_string()))
        }
    }

    async fn close(&self) {
        join_all(self.backends.iter().map(|b| b.close())).await;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// A backend that can be toggled to fault on every operation, for
    /// exercising the fallback/partial-fault properties of spec §8.
    struct FaultableBackend {
        name: &'static str,
        faulty: AtomicBool,
        inner: super::super::MemoryCacheBackend,
    }

    impl FaultableBackend {
        fn new(name: &'static str, faulty: bool) -> Self {
            Self {
                name,
                faulty: AtomicBool::new(faulty),
                inner: super::super::MemoryCacheBackend::with_sweep_interval(
                    std::time::Duration::from_secs(3600),
                ),
            }
        }

        fn set_faulty(&self, faulty: bool) {
            self.faulty.store(faulty, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CacheBackend for FaultableBackend {
        async fn get(&self, key: &str) -> Result<Option<CachedValue>, CacheError> {
            if self.faulty.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("forced fault".into()));
            }
            self.inner.get(key).await
        }

        async fn set(
            &self,
            key: &str,
            value: serde_json::Value,
            ttl_seconds: i64,
        ) -> Result<(), CacheError> {
            if self.faulty.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("forced fault".into()));
            }
            self.inner.set(key, value, ttl_seconds).await
        }

        async fn del(&self, key: &str) -> Result<(), CacheError> {
            if self.faulty.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("forced fault".into()));
            }
            self.inner.del(key).await
        }

        async fn exists(&self, key: &str) -> Result<bool, CacheError> {
            if self.faulty.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("forced fault".into()));
            }
            self.inner.exists(key).await
        }

        async fn get_metadata(&self, key: &str) -> Result<Option<CacheMetadata>, CacheError> {
            if self.faulty.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("forced fault".into()));
            }
            self.inner.get_metadata(key).await
        }

        async fn clear(&self) -> Result<(), CacheError> {
            if self.faulty.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("forced fault".into()));
            }
            self.inner.clear().await
        }

        async fn close(&self) {
            self.inner.close().await;
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn reads_fall_through_a_faulted_preferred_backend() {
        let a = Arc::new(FaultableBackend::new("a", true));
        let b = Arc::new(FaultableBackend::new("b", false));
        b.inner.set("k", serde_json::json!("v"), 60).await.unwrap();

        let composite = CompositeCache::new(vec![a, b]);
        let got = composite.get("k").await.unwrap();
        assert_eq!(got.unwrap().value, serde_json::json!("v"));
    }

    #[tokio::test]
    async fn writes_succeed_if_any_backend_succeeds() {
        let a = Arc::new(FaultableBackend::new("a", true));
        let b = Arc::new(FaultableBackend::new("b", false));
        let composite = CompositeCache::new(vec![a, Arc::clone(&b)]);

        composite.set("k", serde_json::json!(1), 60).await.unwrap();
        assert_eq!(
            b.inner.get("k").await.unwrap().unwrap().value,
            serde_json::json!(1)
        );
    }

    #[tokio::test]
    async fn writes_fail_if_every_backend_fails() {
        let a = Arc::new(FaultableBackend::new("a", true));
        let b = Arc::new(FaultableBackend::new("b", true));
        let composite = CompositeCache::new(vec![a, b]);

        let err = composite.set("k", serde_json::json!(1), 60).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn write_through_visibility_on_every_healthy_backend() {
        let a = Arc::new(FaultableBackend::new("a", false));
        let b = Arc::new(FaultableBackend::new("b", false));
        let composite = CompositeCache::new(vec![Arc::clone(&a), Arc::clone(&b)]);

        composite.set("k", serde_json::json!("v"), 60).await.unwrap();
        assert_eq!(a.inner.get("k").await.unwrap().unwrap().value, serde_json::json!("v"));
        assert_eq!(b.inner.get("k").await.unwrap().unwrap().value, serde_json::json!("v"));
    }

    #[tokio::test]
    async fn status_reflects_the_healthy_backend_after_preferred_fault() {
        let a = Arc::new(FaultableBackend::new("a", true));
        let b = Arc::new(FaultableBackend::new("b", false));
        b.inner.set("k", serde_json::json!(1), 60).await.unwrap();

        let composite = CompositeCache::new(vec![a, b]);
        assert!(composite.exists("k").await.unwrap());
        assert!(composite.get_metadata("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn name_lists_backends_in_preference_order() {
        let a = Arc::new(FaultableBackend::new("remote", false));
        let b = Arc::new(FaultableBackend::new("memory", false));
        let composite = CompositeCache::new(vec![a, b]);
        assert_eq!(composite.name(), "Composite(remote → memory)");
    }

    #[tokio::test]
    async fn partial_fault_toggled_at_runtime_still_falls_back() {
        let a = Arc::new(FaultableBackend::new("a", false));
        let b = Arc::new(FaultableBackend::new("b", false));
        let composite = CompositeCache::new(vec![Arc::clone(&a), Arc::clone(&b)]);
        composite.set("k", serde_json::json!(1), 60).await.unwrap();

        a.set_faulty(true);
        let got = composite.get("k").await.unwrap();
        assert_eq!(got.unwrap().value, serde_json::json!(1));
    }

    #[test]
    fn new_panics_on_empty_backend_list() {
        let result = std::panic::catch_unwind(|| {
            CompositeCache::new(Vec::<Arc<dyn CacheBackend>>::new());
        });
        assert!(result.is_err());
    }
}
