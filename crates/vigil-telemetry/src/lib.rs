//! Logging setup via the `tracing` ecosystem

use vigil_config::TelemetryConfig;

/// Initialize the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured filter. Call once at
/// startup; a second call is an error.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        registry.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);
        registry.with(fmt_layer).try_init()?;
    }

    Ok(())
}
