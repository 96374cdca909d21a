//! Opt-in structured logging setup.
//!
//! This crate instruments itself with `tracing` throughout but never
//! installs a global subscriber on its own — a library that did so would
//! fight with whatever a binary or test harness already configured. Callers
//! that want human-readable output call `init()` once, typically from
//! `main` or a test's setup.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` `fmt` subscriber, honoring `RUST_LOG` via
/// `EnvFilter` (defaulting to `info` when unset). Safe to call more than
/// once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
