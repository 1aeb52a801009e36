//! Single-flight request router (C7, spec §4.5).
//!
//! Keyed `DashMap<String, (generation, Shared<BoxFuture<...>>)>` in
//! place of the teacher's `DashMap<String, Arc<Mutex<()>>>`: the
//! teacher's map only serializes re-checks after a lock is released,
//! which does not give every coalesced waiter the identical result.
//! Here the first caller to miss installs a `Shared` future wrapping
//! the upstream fetch; every concurrent caller for the same key clones
//! that handle and awaits it, so all of them observe one fetch's
//! result, success or failure alike.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use bracket_core::cache::{CacheBackend, CacheMetadata, CachedValue, ResponseMetadata, TournamentResponse};
use bracket_core::domain::Tournament;
use bracket_core::error::{BffError, BffResult};
use bracket_core::key::tournament_key;
use bracket_core::ttl::calculate_ttl;
use bracket_upstream::UpstreamClient;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tracing::warn;

type FetchResult = Result<Arc<Tournament>, BffError>;
type FetchFuture = Shared<BoxFuture<'static, FetchResult>>;

/// Cache-only status view (spec §4.5's `status`): no upstream fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    /// Whether a live entry exists for this tournament.
    pub cached: bool,
    /// Freshness metadata, present only when `cached` is true.
    pub metadata: Option<CacheMetadata>,
}

/// Removes the in-flight entry for `key` when the fetch it guards
/// resolves, but only if that entry is still this fetch's — a refresh
/// that installed a newer entry for the same key in the meantime must
/// not have its entry stolen by a stale leader's cleanup.
struct CleanupGuard {
    map: Arc<DashMap<String, (u64, FetchFuture)>>,
    key: String,
    generation: u64,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.map.remove_if(&self.key, |_, (g, _)| *g == self.generation);
    }
}

/// Cache-aware read/refresh/status router with single-flight
/// deduplication of concurrent misses (C7).
pub struct TournamentRouter {
    cache: Arc<dyn CacheBackend>,
    upstream: UpstreamClient,
    in_flight: Arc<DashMap<String, (u64, FetchFuture)>>,
    generation: AtomicU64,
}

impl TournamentRouter {
    /// Build a router over a cache backend and upstream client.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheBackend>, upstream: UpstreamClient) -> Self {
        Self {
            cache,
            upstream,
            in_flight: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Cache-aware read (spec §4.5). On a cache hit with `refresh`
    /// false, returns `{cached: true, ...}` without touching upstream.
    /// Otherwise joins or starts a single-flight fetch.
    ///
    /// # Errors
    /// Propagates [`BffError`] from the upstream fetch; cache read
    /// faults are logged and fall through to upstream instead of
    /// failing the request.
    pub async fn read(&self, slug: &str, refresh: bool) -> BffResult<TournamentResponse> {
        let key = tournament_key(slug);

        if !refresh {
            match self.cache.get(&key).await {
                Ok(Some(cached)) => return Self::cached_response(cached),
                Ok(None) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "cache read fault, falling through to upstream");
                }
            }
        }

        let tournament = self.join_or_start(slug, &key, refresh).await?;
        Ok(Self::fresh_response(&tournament))
    }

    /// Forced refresh (spec §4.5): always deletes the existing entry,
    /// fetches upstream, and installs a fresh single-flight entry that
    /// bypasses (never joins) any fetch already in flight for this key.
    ///
    /// # Errors
    /// Propagates [`BffError`] from the upstream fetch.
    pub async fn refresh(&self, slug: &str) -> BffResult<TournamentResponse> {
        let key = tournament_key(slug);
        if let Err(e) = self.cache.del(&key).await {
            warn!(key = %key, error = %e, "cache delete fault during refresh, continuing");
        }
        let tournament = self.join_or_start(slug, &key, true).await?;
        Ok(Self::fresh_response(&tournament))
    }

    /// Cache-only status (spec §4.5): never touches upstream.
    ///
    /// # Errors
    /// Never returns an error; a cache fault is logged and reported as
    /// an uncached status, matching §7's cache-fault degrade rule.
    pub async fn status(&self, slug: &str) -> BffResult<CacheStatus> {
        let key = tournament_key(slug);
        match self.cache.get_metadata(&key).await {
            Ok(Some(metadata)) => Ok(CacheStatus { cached: true, metadata: Some(metadata) }),
            Ok(None) => Ok(CacheStatus { cached: false, metadata: None }),
            Err(e) => {
                warn!(key = %key, error = %e, "cache status fault, reporting uncached");
                Ok(CacheStatus { cached: false, metadata: None })
            }
        }
    }

    async fn join_or_start(&self, slug: &str, key: &str, force: bool) -> FetchResult {
        let fut = if force {
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let fut = self.spawn_fetch(slug.to_string(), key.to_string(), generation);
            self.in_flight.insert(key.to_string(), (generation, fut.clone()));
            fut
        } else {
            match self.in_flight.entry(key.to_string()) {
                Entry::Occupied(existing) => existing.get().1.clone(),
                Entry::Vacant(slot) => {
                    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let fut = self.spawn_fetch(slug.to_string(), key.to_string(), generation);
                    slot.insert((generation, fut.clone()));
                    fut
                }
            }
        };
        fut.await
    }

    /// Spawn the upstream fetch on its own task so a cancelled leader
    /// (the caller whose `.await` dropped the `Shared` handle) never
    /// stops the fetch for any other waiter still polling it (spec §5).
    fn spawn_fetch(&self, slug: String, key: String, generation: u64) -> FetchFuture {
        let cache = Arc::clone(&self.cache);
        let upstream = self.upstream.clone();
        let in_flight = Arc::clone(&self.in_flight);

        let handle = tokio::spawn(async move {
            let _guard = CleanupGuard { map: in_flight, key: key.clone(), generation };
            fetch_and_cache(&upstream, cache.as_ref(), &key, &slug).await
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(BffError::Bug(format!("upstream fetch task failed: {e}"))),
            }
        }
        .boxed()
        .shared()
    }

    fn cached_response(cached: CachedValue) -> BffResult<TournamentResponse> {
        let tournament: Tournament = serde_json::from_value(cached.value)
            .map_err(|e| BffError::Bug(format!("corrupt cache entry: {e}")))?;
        let decision = calculate_ttl(&tournament);
        let ttl_remaining = cached
            .expires_at
            .duration_since(SystemTime::now())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Ok(TournamentResponse {
            data: tournament,
            cached: true,
            metadata: ResponseMetadata {
                cached_at: Some(cached.created_at),
                ttl: Some(ttl_remaining),
                has_ongoing_matches: decision.has_ongoing_matches,
                has_recent_matches: decision.has_recent_matches,
                counts: decision.counts,
            },
        })
    }

    fn fresh_response(tournament: &Arc<Tournament>) -> TournamentResponse {
        let decision = calculate_ttl(tournament);
        TournamentResponse {
            data: (**tournament).clone(),
            cached: false,
            metadata: ResponseMetadata {
                cached_at: Some(SystemTime::now()),
                ttl: Some(decision.ttl_seconds),
                has_ongoing_matches: decision.has_ongoing_matches,
                has_recent_matches: decision.has_recent_matches,
                counts: decision.counts,
            },
        }
    }
}

async fn fetch_and_cache(
    upstream: &UpstreamClient,
    cache: &dyn CacheBackend,
    key: &str,
    slug: &str,
) -> FetchResult {
    let tournament = upstream.fetch_tournament(slug, None).await?;
    let decision = calculate_ttl(&tournament);
    let value = serde_json::to_value(&tournament)
        .map_err(|e| BffError::Bug(format!("failed to serialize tournament: {e}")))?;

    if let Err(e) = cache.set(key, value, decision.ttl_seconds).await {
        warn!(key = %key, error = %e, "cache write-through fault after successful upstream fetch");
    }

    Ok(Arc::new(tournament))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::time::Duration;

    use bracket_resilience::cache::MemoryCacheBackend;
    use bracket_upstream::{UpstreamClient, UpstreamConfig};
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn tournament_envelope(slug: &str) -> serde_json::Value {
        json!({
            "data": {
                "tournament": {
                    "id": "t1",
                    "name": "Demo",
                    "slug": slug,
                    "url": null,
                    "events": []
                }
            }
        })
    }

    async fn router_against(mock: &MockServer) -> TournamentRouter {
        let config = UpstreamConfig {
            min_interval: Duration::from_millis(1),
            request_timeout: Duration::from_secs(5),
            ..UpstreamConfig::new(mock.uri(), "token")
        };
        let upstream = UpstreamClient::new(config).unwrap();
        let cache: Arc<dyn CacheBackend> = Arc::new(MemoryCacheBackend::new());
        TournamentRouter::new(cache, upstream)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_misses_collapse_to_one_upstream_fetch() {
        let mock = MockServer::start().await;
        let dispatch_count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&dispatch_count);

        Mock::given(method("POST"))
            .respond_with(move |_: &wiremock::Request| {
                counter.fetch_add(1, AtomicOrdering::SeqCst);
                ResponseTemplate::new(200).set_delay(Duration::from_millis(100)).set_body_json(tournament_envelope("evo"))
            })
            .mount(&mock)
            .await;

        let router = Arc::new(router_against(&mock).await);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let router = Arc::clone(&router);
            handles.push(tokio::spawn(async move { router.read("evo", false).await }));
        }

        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.data.slug, "evo");
            assert!(!response.cached);
        }

        assert_eq!(dispatch_count.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn a_cache_hit_never_touches_upstream() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tournament_envelope("evo")))
            .expect(1)
            .mount(&mock)
            .await;

        let router = router_against(&mock).await;
        let first = router.read("evo", false).await.unwrap();
        assert!(!first.cached);

        let second = router.read("evo", false).await.unwrap();
        assert!(second.cached);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_always_reaches_upstream_even_on_a_warm_cache() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tournament_envelope("evo")))
            .expect(2)
            .mount(&mock)
            .await;

        let router = router_against(&mock).await;
        let first = router.read("evo", false).await.unwrap();
        assert!(!first.cached);

        let refreshed = router.refresh("evo").await.unwrap();
        assert!(!refreshed.cached);
    }

    #[tokio::test]
    async fn status_reports_uncached_before_any_read() {
        let mock = MockServer::start().await;
        let router = router_against(&mock).await;
        let status = router.status("never-fetched").await.unwrap();
        assert!(!status.cached);
        assert!(status.metadata.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_reports_cached_after_a_read() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tournament_envelope("evo")))
            .mount(&mock)
            .await;

        let router = router_against(&mock).await;
        router.read("evo", false).await.unwrap();
        let status = router.status("evo").await.unwrap();
        assert!(status.cached);
        assert!(status.metadata.is_some());
    }
}
