//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// JSON lines by default; set `BREWPOS_LOG_FORMAT=pretty` for human-readable
/// output during development. Levels come from `RUST_LOG` (default `info`).
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let pretty = std::env::var("BREWPOS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("pretty"))
        .unwrap_or(false);

    if pretty {
        let _ = builder.pretty().try_init();
    } else {
        let _ = builder.json().try_init();
    }
}
