//! # Bracket Server
//!
//! The tournament BFF's HTTP surface: the single-flight request router
//! (C7), route assembly, handlers, and the ambient request-id/CORS/
//! tracing middleware stack.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use error::ApiError;
pub use health::HealthStatus;
pub use router::{CacheStatus, TournamentRouter};
pub use routes::build_router;
pub use shutdown::shutdown_signal;
pub use state::AppState;
