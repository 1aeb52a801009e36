//! Request-scoped extractors.
//!
//! Trimmed to the one idiom this BFF reuses from the teacher's
//! `extractors.rs`: a request-id extractor/fallback. The teacher's
//! `TenantId`, `ApiKey`, `OptionalApiKey`, `ClientIp`, and `ExecutionCtx`
//! extractors have no counterpart — this BFF has no per-tenant or
//! per-user request shape — and were dropped.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use uuid::Uuid;

/// Header carrying the request id, both inbound (if the caller set
/// one) and outbound (always set on the response).
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A request id, read from `x-request-id` if present, otherwise a
/// freshly generated UUID.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Encode as a header value, falling back to a placeholder if the
    /// id somehow contains characters invalid in a header.
    #[must_use]
    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static("invalid"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue as HV};

    #[tokio::test]
    async fn prefers_an_inbound_request_id_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HV::from_static("caller-supplied"));
        let mut parts = http::Request::builder().body(()).unwrap().into_parts().0;
        parts.headers = headers;

        let RequestId(id) = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id, "caller-supplied");
    }

    #[tokio::test]
    async fn generates_one_when_absent() {
        let mut parts = http::Request::builder().body(()).unwrap().into_parts().0;
        let RequestId(id) = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
