//! Cache factory (C4, spec §4.2, §6): chooses the in-memory backend
//! alone, or a `[remote, in-memory]` composite, from configuration.
//!
//! Grounded on the env-var-driven construction idiom in the teacher's
//! `main.rs::create_provider_registry` (branch on a variable's
//! presence to pick an implementation), generalized to cache
//! backends.

use std::sync::Arc;
use std::time::Duration;

use bracket_core::cache::{CacheBackend, CacheError};
use tracing::info;

use super::{CompositeCache, MemoryCacheBackend, RedisCacheBackend};

/// Inputs to the cache factory.
#[derive(Debug, Clone)]
pub struct CacheFactoryConfig {
    /// When present, a remote cache is layered in front of the
    /// in-memory backend as `[remote, memory]`. When absent, the
    /// in-memory backend is used alone.
    pub remote_cache_url: Option<String>,
    /// Sweep interval for the in-memory backend's expiry sweep.
    pub memory_sweep_interval: Duration,
}

/// Build the cache backend named by `config` (spec §6's
/// `REMOTE_CACHE_URL`).
///
/// # Errors
/// Returns [`CacheError::Unavailable`] if `remote_cache_url` is set
/// but the remote backend cannot be reached.
pub async fn build_cache(
    config: &CacheFactoryConfig,
) -> Result<Arc<dyn CacheBackend>, CacheError> {
    let memory = Arc::new(MemoryCacheBackend::with_sweep_interval(
        config.memory_sweep_interval,
    ));

    match &config.remote_cache_url {
        Some(url) => {
            info!(backend = "composite", "building composite cache [remote, memory]");
            let remote = Arc::new(RedisCacheBackend::connect(url).await?);
            let backends: Vec<Arc<dyn CacheBackend>> = vec![remote, memory];
            Ok(Arc::new(CompositeCache::new(backends)))
        }
        None => {
            info!(backend = "memory", "REMOTE_CACHE_URL unset, using in-memory cache alone");
            Ok(memory)
        }
    }
}

impl Default for CacheFactoryConfig {
    fn default() -> Self {
        Self {
            remote_cache_url: None,
            memory_sweep_interval: Duration::from_secs(300),
        }
    }
}
