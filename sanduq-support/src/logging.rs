//! Tracing subscriber setup.
//!
//! The container only emits `tracing` events; installing a subscriber is
//! left to the host. This helper wires the usual `fmt` + `EnvFilter`
//! combination so demos and small binaries get readable output.

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` is used
/// (e.g. `"sanduq=debug"`).
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(directive = default_directive, "Tracing subscriber installed");
    }
    installed
}
