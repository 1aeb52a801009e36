//! Environment-based configuration for the tournament BFF.
//!
//! Loaded once at startup. Unlike the teacher's file-plus-hot-reload
//! configuration layer, this surface is env-var only (spec §10) — no
//! config file, no watcher, no live-swap.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::env;

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;
use validator::Validate;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent.
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    /// An environment variable was present but could not be parsed.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field's env var name.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// A value was present and parsed but failed validation.
    #[error("configuration failed validation: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Fully loaded configuration (spec §10).
#[derive(Debug, Clone, Validate)]
pub struct Config {
    /// Bearer credential for the upstream GraphQL API. Absence is
    /// fatal at startup (`UPSTREAM_TOKEN`).
    pub upstream_token: SecretString,

    /// Upstream GraphQL endpoint.
    pub upstream_base_url: String,

    /// Remote cache connection string. When absent, the cache factory
    /// selects an in-memory-only backend (`REMOTE_CACHE_URL`).
    pub remote_cache_url: Option<String>,

    /// Port the HTTP server listens on (`LISTEN_PORT`, default 3001).
    #[validate(range(min = 1))]
    pub listen_port: u16,

    /// Single CORS origin allowed to read responses (`ALLOWED_ORIGIN`).
    pub allowed_origin: String,

    /// Minimum time between outbound upstream dispatches, in
    /// milliseconds (`UPSTREAM_MIN_INTERVAL_MS`, default 800).
    #[validate(range(min = 1))]
    pub upstream_min_interval_ms: u64,

    /// Maximum retries for a rate-limited upstream request
    /// (`UPSTREAM_MAX_RETRIES`, default 3).
    pub upstream_max_retries: u32,

    /// Base delay for the upstream retry backoff, in milliseconds
    /// (`UPSTREAM_RETRY_BASE_MS`, default 2000).
    #[validate(range(min = 1))]
    pub upstream_retry_base_ms: u64,

    /// Sets fetched per page within a phase group (`PAGE_SIZE`,
    /// default 30).
    #[validate(range(min = 1))]
    pub page_size: u32,

    /// Maximum pages fetched per phase group (`PAGE_LIMIT`,
    /// default 10).
    #[validate(range(min = 1))]
    pub page_limit: u32,

    /// Deployment environment label, surfaced in `/health` (not an
    /// env var in spec §6; derived from `APP_ENV`, default
    /// "development").
    pub environment: String,
}

/// A view of [`Config`] safe to log or serialize: the upstream token
/// is never included.
#[derive(Debug, Serialize)]
pub struct RedactedConfig {
    listen_port: u16,
    allowed_origin: String,
    upstream_base_url: String,
    remote_cache_configured: bool,
    upstream_min_interval_ms: u64,
    upstream_max_retries: u32,
    upstream_retry_base_ms: u64,
    page_size: u32,
    page_limit: u32,
    environment: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingRequired`] if `UPSTREAM_TOKEN` is
    /// absent, [`ConfigError::InvalidValue`] if a numeric env var
    /// fails to parse, or [`ConfigError::Invalid`] if a parsed value
    /// falls outside its valid range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let upstream_token = env::var("UPSTREAM_TOKEN")
            .map_err(|_| ConfigError::MissingRequired("UPSTREAM_TOKEN"))?;

        let config = Self {
            upstream_token: SecretString::new(upstream_token),
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .unwrap_or_else(|_| "https://api.start.gg/gql/alpha".to_string()),
            remote_cache_url: env::var("REMOTE_CACHE_URL").ok(),
            listen_port: parse_env("LISTEN_PORT", 3001)?,
            allowed_origin: env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            upstream_min_interval_ms: parse_env("UPSTREAM_MIN_INTERVAL_MS", 800)?,
            upstream_max_retries: parse_env("UPSTREAM_MAX_RETRIES", 3)?,
            upstream_retry_base_ms: parse_env("UPSTREAM_RETRY_BASE_MS", 2000)?,
            page_size: parse_env("PAGE_SIZE", 30)?,
            page_limit: parse_env("PAGE_LIMIT", 10)?,
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// A redacted view safe to log at startup.
    #[must_use]
    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            listen_port: self.listen_port,
            allowed_origin: self.allowed_origin.clone(),
            upstream_base_url: self.upstream_base_url.clone(),
            remote_cache_configured: self.remote_cache_url.is_some(),
            upstream_min_interval_ms: self.upstream_min_interval_ms,
            upstream_max_retries: self.upstream_max_retries,
            upstream_retry_base_ms: self.upstream_retry_base_ms,
            page_size: self.page_size,
            page_limit: self.page_limit,
            environment: self.environment.clone(),
        }
    }
}

fn parse_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: name,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that
    // touch them so they don't interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            "UPSTREAM_TOKEN",
            "UPSTREAM_BASE_URL",
            "REMOTE_CACHE_URL",
            "LISTEN_PORT",
            "ALLOWED_ORIGIN",
            "UPSTREAM_MIN_INTERVAL_MS",
            "UPSTREAM_MAX_RETRIES",
            "UPSTREAM_RETRY_BASE_MS",
            "PAGE_SIZE",
            "PAGE_LIMIT",
            "APP_ENV",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn missing_token_is_fatal() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("UPSTREAM_TOKEN")));
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("UPSTREAM_TOKEN", "secret-value");

        let config = Config::from_env().unwrap();
        assert_eq!(config.listen_port, 3001);
        assert_eq!(config.upstream_min_interval_ms, 800);
        assert_eq!(config.upstream_max_retries, 3);
        assert_eq!(config.upstream_retry_base_ms, 2000);
        assert_eq!(config.page_size, 30);
        assert_eq!(config.page_limit, 10);
        assert!(config.remote_cache_url.is_none());
        clear_all();
    }

    #[test]
    fn invalid_numeric_value_is_reported_with_its_field_name() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("UPSTREAM_TOKEN", "secret-value");
        env::set_var("LISTEN_PORT", "not-a-port");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "LISTEN_PORT", .. }
        ));
        clear_all();
    }

    #[test]
    fn redacted_view_never_exposes_the_token() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        env::set_var("UPSTREAM_TOKEN", "super-secret");
        let config = Config::from_env().unwrap();
        let json = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!json.contains("super-secret"));
        clear_all();
    }
}
