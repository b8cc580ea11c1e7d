//! Logging setup for hosts that do not install their own subscriber

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "scwflow=info";

/// Installs a `fmt` subscriber on stderr, honouring `RUST_LOG`.
///
/// Returns `false` when a global subscriber was already set.
pub fn try_init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
