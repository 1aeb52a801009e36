//! Route assembly (spec §6, §12).

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{cache_status, health, read_tournament, refresh_tournament};
use crate::middleware::{cors_layer, request_id_middleware};
use crate::state::AppState;

/// Build the full router: the four routes of spec §6, layered with
/// request tracing, CORS, and request-id propagation, following the
/// teacher's `routes.rs` nesting order (innermost layer applied first).
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origin);

    Router::new()
        .route("/health", get(health))
        .route("/api/tournament/:slug", get(read_tournament))
        .route("/api/tournament/:slug/refresh", post(refresh_tournament))
        .route("/api/tournament/:slug/cache-status", get(cache_status))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bracket_resilience::cache::MemoryCacheBackend;
    use bracket_upstream::{UpstreamClient, UpstreamConfig};
    use http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use bracket_core::cache::CacheBackend;

    async fn test_state(mock: &MockServer) -> AppState {
        let config = UpstreamConfig {
            min_interval: Duration::from_millis(1),
            request_timeout: Duration::from_secs(5),
            ..UpstreamConfig::new(mock.uri(), "token")
        };
        let upstream = UpstreamClient::new(config).unwrap();
        let cache: Arc<dyn CacheBackend> = Arc::new(MemoryCacheBackend::new());
        AppState::new(cache, upstream, "http://localhost:5173", "test")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn health_reports_ok() {
        let mock = MockServer::start().await;
        let router = build_router(test_state(&mock).await);

        let response = router
            .oneshot(Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "ok");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn a_missing_tournament_surfaces_as_404() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "tournament": null }
            })))
            .mount(&mock)
            .await;

        let router = build_router(test_state(&mock).await);
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/tournament/does-not-exist")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn responses_carry_a_request_id_header() {
        let mock = MockServer::start().await;
        let router = build_router(test_state(&mock).await);

        let response = router
            .oneshot(Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().get("x-request-id").is_some());
    }
}
