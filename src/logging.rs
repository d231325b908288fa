// ABOUTME: Installs the global tracing subscriber. RUST_LOG takes precedence
// ABOUTME: over the configured level.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when neither `RUST_LOG` nor a level is given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `level` (a filter directive such as `info` or `evalkit=debug`).
///
/// Only the first call in a process has an effect; later calls return
/// `false`.
pub fn init(level: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(DEFAULT_LOG_LEVEL)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
