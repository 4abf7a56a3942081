use indexmap::IndexMap;
use serde::Deserialize;

/// API-key authentication configuration
///
/// The static key map is the POC-grade default; production deployments
/// swap in a database-backed resolver behind the same trait.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Whether inbound requests must present a valid API key
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Header carrying the gateway API key
    #[serde(default = "default_header")]
    pub header_name: String,
    /// API key to team mapping
    #[serde(default)]
    pub keys: IndexMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header_name: default_header(),
            keys: IndexMap::new(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_header() -> String {
    "X-API-Key".to_string()
}
