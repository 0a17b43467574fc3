//! Basic tracing initialization for host applications.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with an env-filter and fmt layer.
///
/// Intended for hosts embedding the plugin outside a studio runtime (CLIs,
/// import scripts, tests). Respects `RUST_LOG`; defaults to `vidkit=debug`.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "vidkit=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
