//! Logging setup: tracing with an env-filter, plain or JSON output.

use tracing_subscriber::EnvFilter;

/// Env var selecting the log output format ("json" or anything else for
/// human-readable).
pub const LOG_FORMAT_ENV: &str = "STOLENBOT_LOG_FORMAT";

/// Initialize the global subscriber. Safe to call once at startup; a second
/// call is ignored so tests that construct the CLI do not panic.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };
    // Already-initialized is fine.
    drop(result);
}
