use serde::Deserialize;

/// Logging configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub log_filter: String,
    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_filter(),
            json_logs: false,
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}
