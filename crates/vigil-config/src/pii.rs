use serde::Deserialize;

/// PII redaction configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PiiConfig {
    /// Whether message content is redacted before leaving the gateway
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}
