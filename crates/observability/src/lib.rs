//! Tracing/logging setup shared by binaries and tests.

/// Initialize process-wide tracing from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
/// An unparseable `VIEWKIT_LOG_FORMAT` falls back to JSON output; `RUST_LOG`
/// is honored either way.
pub fn init() {
    tracing::init_with(&config::ObservabilityConfig::from_env_lenient());
}

/// Environment configuration.
pub mod config;

/// Subscriber installation.
pub mod tracing;

pub use config::{ConfigError, LogFormat, ObservabilityConfig};
