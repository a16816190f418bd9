//! Tracing initialisation shared by the binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_level` (from `[logging]`)
/// applies. Output goes to stderr so stdout stays free for reports.
pub fn init_tracing(default_level: &str) -> crate::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| crate::Error::Internal(format!("Tracing init failed: {}", e)))
}
