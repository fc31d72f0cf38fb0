//! Logging bootstrap for parallaxctl.
//!
//! The library logs through `tracing` and an injected step observer; the
//! subscriber is installed exactly once here, never inside the core.
//! Filter with `PARALLAX_LOG`, e.g. `PARALLAX_LOG=parallax_common=debug`.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter =
        EnvFilter::try_from_env("PARALLAX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
