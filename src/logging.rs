//! Log output setup
//!
//! Logs go to stderr so listings on stdout stay pipeable. `RUST_LOG` wins
//! over the `--log-level` flag when it is set and parses.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level used when neither `RUST_LOG` nor the flag yield a valid filter
pub const DEFAULT_LEVEL: &str = "warn";

/// Picks the filter directive: `env` first, then `level`, then [`DEFAULT_LEVEL`]
pub fn build_filter(level: &str, env: Option<String>) -> EnvFilter {
    env.filter(|directive| !directive.trim().is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs the global subscriber.
///
/// Fails if a subscriber was already installed.
pub fn init_logging(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = build_filter(level, std::env::var("RUST_LOG").ok());
    let use_ansi = std::io::stderr().is_terminal();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(use_ansi)
                .with_target(true)
                .with_level(true),
        )
        .try_init()
}
