//! Shared helpers for httpoll integration tests

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a tracing subscriber once for the whole test binary so the
/// poller's stop/auto-stop messages show up under `--nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}
