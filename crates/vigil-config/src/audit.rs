use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

/// Audit log configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// JSONL file to append entries to; disabled when absent
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// SIEM webhook receiving every entry, best effort
    #[serde(default)]
    pub siem_webhook_url: Option<Url>,
    /// Entries retained in memory for the recent-entries endpoint
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            siem_webhook_url: None,
            recent_capacity: default_recent_capacity(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_recent_capacity() -> usize {
    1000
}
