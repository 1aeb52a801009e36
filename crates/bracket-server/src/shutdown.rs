//! Graceful shutdown signal (spec §12).
//!
//! Trimmed from the teacher's `ShutdownCoordinator` — phase tracking,
//! in-flight request counters, a broadcast event stream, background
//! task cancellation — to the one piece this BFF still needs:
//! `axum::serve`'s own `with_graceful_shutdown` already stops accepting
//! new connections and drains in-flight requests once its future
//! resolves, so only the signal-waiting half of the teacher's module
//! survives, generalized from four signals down to the two spec §12
//! names.

use tokio::signal;
use tracing::info;

/// Resolves on ctrl-c or, on unix, SIGTERM — whichever arrives first.
///
/// # Panics
/// Panics if a signal handler cannot be installed; this is a
/// process-bootstrap failure with no sensible recovery.
#[allow(clippy::expect_used)]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, draining in-flight requests");
}
