//! Tracing setup
// (c) Bakelite Contributors

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{EnvFilter, prelude::*};

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Environment variable that controls what gets logged to stderr
const STANDARD_ENV_VAR: &str = "RUST_LOG";

/// Set up tracing to stderr.
///
/// By default we log only our own events, at the given trace level. This can be
/// overridden by setting `RUST_LOG`.
///
/// **NOTE:** You can only run this once per process. A global flag prevents re-running.
pub(crate) fn setup(trace_level: &str) -> anyhow::Result<()> {
    if is_initialized() {
        tracing::warn!("tracing::setup called a second time (ignoring)");
        return Ok(());
    }
    TRACING_INITIALIZED.store(true, Ordering::Relaxed);

    let filter = EnvFilter::try_from_env(STANDARD_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(format!("bakelite={trace_level}")))?;
    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(layer).init();
    Ok(())
}

/// Returns whether tracing has been initialized
pub(crate) fn is_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::Relaxed)
}

#[cfg(test)]
mod test {
    use super::is_initialized;

    #[test]
    fn starts_uninitialised_or_initialised_is_idempotent() {
        // We can't assert the starting state reliably (test order), but calling
        // setup twice must never panic or error.
        let _ = super::setup("info");
        let _ = super::setup("info");
        assert!(is_initialized());
    }
}
