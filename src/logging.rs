//! Logging setup for the pipeline and its demo binary.
//!
//! Installs a global tracing subscriber writing to stdout, filtered by
//! `RUST_LOG` with an `info` default.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize tracing to write to stdout.
///
/// Subsequent calls are no-ops, as is running under a test harness
/// that already installed a subscriber.
pub fn init() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init();
    });
}
