use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with human-readable output on stderr.
///
/// Stderr, because stdout is the hook protocol channel — a log line mixed
/// into a JSON response would corrupt it. Uses `RUST_LOG` if set, otherwise
/// the level from project config.
///
/// Safe to call multiple times (e.g. in tests) — subsequent calls are no-ops.
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .try_init()
        .ok();
}
