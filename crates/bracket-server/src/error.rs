//! HTTP-facing error type (spec §4.5, §7, §9).
//!
//! Every handler funnels its [`BffError`] through here so the response
//! body shape (`{error, source}`) and status-code mapping stay in one
//! place, in the same wrap-the-core-error idiom as the teacher's
//! `gateway-server::error::ApiError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bracket_core::error::BffError;
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    source: &'static str,
}

/// The HTTP-facing error wrapper (spec §7's taxonomy, mapped to status
/// codes per §4.5).
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 400: malformed request (spec §7 invalid-request).
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    /// 404: upstream reports the tournament does not exist.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    /// 503: upstream rate limit exhausted the retry budget.
    #[must_use]
    pub fn rate_limited() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "rate limited by upstream".to_string(),
        }
    }

    /// 503: upstream 5xx or a network failure.
    #[must_use]
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self { status: StatusCode::SERVICE_UNAVAILABLE, message: message.into() }
    }

    /// 500: missing or invalid credentials.
    #[must_use]
    pub fn fatal_configuration(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }

    /// 500: unexpected internal error, message redacted by the caller
    /// where it might carry sensitive detail.
    #[must_use]
    pub fn bug(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }
}

impl From<BffError> for ApiError {
    fn from(err: BffError) -> Self {
        match err {
            BffError::InvalidRequest(msg) => Self::invalid_request(msg),
            BffError::NotFound(msg) => Self::not_found(msg),
            BffError::RateLimited => {
                warn!("rate limited by upstream, exhausted retry budget");
                Self::rate_limited()
            }
            BffError::UpstreamUnavailable(msg) => {
                warn!(error = %msg, "upstream unavailable");
                Self::upstream_unavailable(msg)
            }
            BffError::FatalConfiguration(msg) => {
                error!(error = %msg, "fatal configuration error");
                Self::fatal_configuration(msg)
            }
            BffError::CacheFault(msg) => {
                // Reaches here only if a cache fault escaped without a
                // fallback; still never the token, never the upstream
                // payload.
                warn!(error = %msg, "unrecovered cache fault");
                Self::bug(msg)
            }
            BffError::Bug(msg) => {
                error!(error = %msg, "internal error");
                Self::bug(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody { error: self.message, source: "backend" });
        (self.status, body).into_response()
    }
}
