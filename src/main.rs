//! # Bracket BFF
//!
//! Backend-for-frontend caching and rate-limiting layer in front of a
//! tournament bracket GraphQL API.
//!
//! ## Usage
//!
//! ```bash
//! UPSTREAM_TOKEN=secret bracket-bff
//! LISTEN_PORT=8080 UPSTREAM_TOKEN=secret bracket-bff
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bracket_config::Config;
use bracket_core::cache::CacheBackend;
use bracket_resilience::cache::{build_cache, CacheFactoryConfig};
use bracket_server::{build_router, shutdown_signal, AppState};
use bracket_telemetry::{init_logging, LoggingConfig};
use bracket_upstream::{UpstreamClient, UpstreamConfig};
use secrecy::ExposeSecret;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging(&LoggingConfig::from_env()) {
        eprintln!("failed to initialize logging: {e}");
    }

    info!(version = env!("CARGO_PKG_VERSION"), "starting bracket-bff");

    if let Err(e) = run().await {
        error!(error = %e, "bracket-bff exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    info!(config = ?config.redacted(), "configuration loaded");

    let cache: Arc<dyn CacheBackend> = build_cache(&CacheFactoryConfig {
        remote_cache_url: config.remote_cache_url.clone(),
        memory_sweep_interval: Duration::from_secs(300),
    })
    .await?;

    let upstream_config = UpstreamConfig {
        min_interval: Duration::from_millis(config.upstream_min_interval_ms),
        max_retries: config.upstream_max_retries,
        retry_base_delay: Duration::from_millis(config.upstream_retry_base_ms),
        page_size: config.page_size,
        page_limit: config.page_limit,
        ..UpstreamConfig::new(&config.upstream_base_url, config.upstream_token.expose_secret())
    };
    let upstream = UpstreamClient::new(upstream_config)?;

    let state = AppState::new(cache, upstream, &config.allowed_origin, &config.environment);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}
