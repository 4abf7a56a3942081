//! API-key to team resolution
//!
//! The gateway trusts only the resolved team identity; any `team_id`
//! carried in a request payload is informational. The static config-backed
//! resolver is the default implementation; production deployments plug a
//! database-backed resolver into the same trait.

use indexmap::IndexMap;
use thiserror::Error;
use vigil_config::AuthConfig;

/// Authentication failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No API key was presented
    #[error("missing API key")]
    MissingKey,
    /// The presented key resolves to no team
    #[error("invalid API key")]
    InvalidKey,
}

/// Resolve an API key to the owning team
pub trait TeamResolver: Send + Sync {
    /// Map `api_key` to a team identifier
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKey`] for unknown keys.
    fn resolve(&self, api_key: &str) -> Result<String, AuthError>;
}

/// Resolver backed by the configured key map
pub struct StaticKeyResolver {
    keys: IndexMap<String, String>,
}

impl StaticKeyResolver {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            keys: config.keys.clone(),
        }
    }
}

impl TeamResolver for StaticKeyResolver {
    fn resolve(&self, api_key: &str) -> Result<String, AuthError> {
        self.keys.get(api_key).cloned().ok_or(AuthError::InvalidKey)
    }
}
