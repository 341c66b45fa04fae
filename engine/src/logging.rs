//! Console logging setup for the binary.
//!
//! `RUST_LOG` controls the filter (default: `info`), e.g.
//! `RUST_LOG=harmonizer=debug`.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
