//! Tracing setup for applications embedding the engine.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`; defaults the crate to `info`. Intended to be called
/// once by the embedding application, not by the library itself.
pub fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("tariff_analyzer=info".parse().unwrap_or_else(|_| "info".parse().unwrap()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
