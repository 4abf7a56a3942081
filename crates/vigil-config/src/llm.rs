use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Top-level LLM configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, LlmProviderConfig>,
    /// Fallback order; providers absent from this list are appended in
    /// configuration order
    #[serde(default)]
    pub priority: Vec<String>,
    /// Circuit breaker tuning, shared by all providers
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Price table overrides: provider -> model -> USD per 1K tokens
    #[serde(default)]
    pub pricing: IndexMap<String, IndexMap<String, ModelPrice>>,
}

/// Configuration for a single LLM provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmProviderConfig {
    /// Provider protocol type
    #[serde(rename = "type")]
    pub provider_type: LlmProviderType,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model used when the request does not name one
    ///
    /// For Azure providers this is the deployment name.
    #[serde(default)]
    pub default_model: Option<String>,
    /// API version query parameter, Azure providers only
    #[serde(default)]
    pub api_version: Option<String>,
    /// Per-attempt request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Supported LLM provider protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderType {
    /// OpenAI-compatible chat completions API
    Openai,
    /// Azure OpenAI deployment, same wire format with resource-scoped URLs
    Azure,
    /// Anthropic Messages API
    Anthropic,
    /// Google Generative Language API
    Google,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before a trial is allowed
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// USD price per 1K tokens for a single model
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPrice {
    /// Prompt-side price
    pub input_per_1k: f64,
    /// Completion-side price
    pub output_per_1k: f64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_failure_threshold() -> u32 {
    3
}

#[allow(clippy::missing_const_for_fn)]
fn default_cooldown_secs() -> u64 {
    60
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout_secs() -> u64 {
    30
}
