//! Subscriber setup for the CLI. Library code only emits events.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the `EnvFilter` directive.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Install a stderr fmt subscriber filtered by `LOG_LEVEL` (default `info`).
///
/// Stdout is left alone. Calling this twice is harmless.
pub fn init() {
    let filter = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
