//! Request-id propagation and CORS (spec §6, §12).

use axum::extract::{FromRequestParts, Request};
use axum::http::{HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::CorsLayer;

use crate::extractors::{RequestId, REQUEST_ID_HEADER};

/// Assign a request id when the caller didn't supply one, and mirror
/// it back on the response so clients can correlate logs.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let request_id = RequestId::from_request_parts(&mut parts, &())
        .await
        .unwrap_or_else(|infallible| match infallible {});
    let header_value = request_id.header_value();
    parts.headers.insert(REQUEST_ID_HEADER, header_value.clone());
    let request = Request::from_parts(parts, body);

    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    response
}

/// Build the CORS layer for the single configurable origin spec §6
/// names, with credentials enabled.
#[must_use]
pub fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}
