//! Shared application state (spec §10, §12).

use std::sync::Arc;

use bracket_core::cache::CacheBackend;
use bracket_upstream::UpstreamClient;

use crate::router::TournamentRouter;

/// State shared across every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The single-flight cache-aware router (C7).
    pub router: Arc<TournamentRouter>,
    /// CORS origin allowed to read responses.
    pub allowed_origin: String,
    /// Deployment environment label surfaced in `/health`.
    pub environment: String,
}

impl AppState {
    /// Build the application state from its already-constructed
    /// dependencies.
    #[must_use]
    pub fn new(
        cache: Arc<dyn CacheBackend>,
        upstream: UpstreamClient,
        allowed_origin: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            router: Arc::new(TournamentRouter::new(cache, upstream)),
            allowed_origin: allowed_origin.into(),
            environment: environment.into(),
        }
    }
}
