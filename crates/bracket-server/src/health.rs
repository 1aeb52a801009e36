//! Liveness endpoint (spec §6).
//!
//! Trimmed from the teacher's enterprise health-check system —
//! `HealthConfig`, liveness/readiness/startup probes,
//! `ComponentHealth`, provider-aware degraded states — to the single
//! shape spec.md §6 names: `{status: "ok", timestamp, environment}`.
//! There is no dependent-service fan-out to probe: the cache backend
//! degrades gracefully on its own, and the upstream worker has no
//! separate health signal to report.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// The `/health` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Always `"ok"`: the endpoint is reachable only while the process
    /// is alive.
    pub status: &'static str,
    /// Epoch seconds at the time of the request.
    pub timestamp: u64,
    /// Deployment environment label (`APP_ENV`).
    pub environment: String,
}

impl HealthStatus {
    /// Build a fresh liveness response.
    #[must_use]
    pub fn ok(environment: impl Into<String>) -> Self {
        Self {
            status: "ok",
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            environment: environment.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_ok_with_the_given_environment() {
        let health = HealthStatus::ok("production");
        assert_eq!(health.status, "ok");
        assert_eq!(health.environment, "production");
    }
}
