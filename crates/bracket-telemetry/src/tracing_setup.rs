//! Structured logging setup (spec §11).
//!
//! Trimmed from the teacher's distributed-tracing module: this BFF has
//! no OTLP exporter to feed, so only the `tracing_subscriber` half of
//! `init_tracing` survives, generalized to a plain `init_logging`.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, for local development.
    Pretty,
    /// One JSON object per line, for production log pipelines.
    Json,
}

/// Logging configuration (spec §11: `RUST_LOG` overrides the default
/// filter, `LOG_FORMAT=json` switches output format).
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Build a config from the process environment: `RUST_LOG` for
    /// the filter, `LOG_FORMAT=json` for JSON output.
    #[must_use]
    pub fn from_env() -> Self {
        let format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        Self {
            default_filter: "info".to_string(),
            format,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
/// Returns [`TracingError::Init`] if a subscriber is already
/// installed for this process.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TracingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };
    result.map_err(|e| TracingError::Init(e.to_string()))?;

    info!(format = ?config.format, "logging initialized");
    Ok(())
}

/// Logging initialization error.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// A subscriber was already installed.
    #[error("failed to initialize logging: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_pretty_and_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.default_filter, "info");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn from_env_selects_json_when_requested() {
        std::env::set_var("LOG_FORMAT", "json");
        let config = LoggingConfig::from_env();
        assert_eq!(config.format, LogFormat::Json);
        std::env::remove_var("LOG_FORMAT");
    }
}
