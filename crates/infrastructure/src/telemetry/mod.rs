//! Logging setup
//!
//! Installs the global `tracing` subscriber. Log lines go to stderr so that
//! command output on stdout stays machine-readable.

mod logging;

pub use logging::{TelemetryConfig, TelemetryError, init_telemetry};
