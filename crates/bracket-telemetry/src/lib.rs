//! # Bracket Telemetry
//!
//! Structured logging for the tournament BFF. The teacher's
//! OpenTelemetry export, per-tenant audit trail, cost accounting, and
//! PII redaction modules have no counterpart in this BFF's scope and
//! were dropped.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod tracing_setup;

pub use tracing_setup::{init_logging, LogFormat, LoggingConfig, TracingError};
