/*!
 * Tracing Setup
 * Structured logging for the policy engine using the tracing crate
 *
 * The library only emits events; binaries and services decide whether and how
 * to install a subscriber.
 */

use crate::core::env_flag;
use crate::core::limits::ENV_TRACE_JSON;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with the default `info` filter
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - APPROVAL_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() -> bool {
    init_tracing_with_default("info")
}

/// Initialize structured tracing, falling back to `default_filter` when
/// RUST_LOG is unset
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing_with_default(default_filter: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    if env_flag(ENV_TRACE_JSON) {
        // JSON output for production/parsing
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    }
}
