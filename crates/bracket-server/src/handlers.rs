//! HTTP handlers (spec §6): the four routes over health and the
//! tournament router.

use axum::extract::{Path, Query, State};
use axum::Json;
use bracket_core::cache::TournamentResponse;
use bracket_core::error::BffError;
use serde::Deserialize;

use crate::error::ApiError;
use crate::health::HealthStatus;
use crate::router::CacheStatus;
use crate::state::AppState;

/// Query parameters accepted by `GET /api/tournament/:slug`.
#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    /// When true, bypasses a warm cache entry and forces an upstream
    /// fetch (equivalent to hitting the `/refresh` route first).
    #[serde(default)]
    pub refresh: bool,
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::ok(state.environment.clone()))
}

/// `GET /api/tournament/:slug`.
///
/// # Errors
/// Returns [`ApiError`] mapped from whichever [`BffError`] the router
/// surfaces.
pub async fn read_tournament(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<TournamentResponse>, ApiError> {
    validate_slug(&slug)?;
    let response = state.router.read(&slug, query.refresh).await?;
    Ok(Json(response))
}

/// `POST /api/tournament/:slug/refresh`.
///
/// # Errors
/// Returns [`ApiError`] mapped from whichever [`BffError`] the router
/// surfaces.
pub async fn refresh_tournament(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TournamentResponse>, ApiError> {
    validate_slug(&slug)?;
    let response = state.router.refresh(&slug).await?;
    Ok(Json(response))
}

/// `GET /api/tournament/:slug/cache-status`.
///
/// # Errors
/// Returns [`ApiError`] mapped from whichever [`BffError`] the router
/// surfaces.
pub async fn cache_status(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CacheStatus>, ApiError> {
    validate_slug(&slug)?;
    let status = state.router.status(&slug).await?;
    Ok(Json(status))
}

fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if slug.trim().is_empty() {
        return Err(BffError::InvalidRequest("tournament slug must not be empty".to_string()).into());
    }
    Ok(())
}
