//! Provider adapter trait and implementations for LLM backends

pub mod anthropic;
pub mod azure;
pub mod google;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use vigil_config::{LlmProviderConfig, LlmProviderType};

use crate::error::AdapterError;
use crate::types::{AdapterResponse, Message};

/// Trait implemented by each LLM provider backend
///
/// Adapters translate the canonical message format to the provider's
/// wire protocol and normalize the response. They report failures as
/// [`AdapterError`] so the router can classify them; they never retry
/// on their own.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Configured provider name
    fn name(&self) -> &str;

    /// Model used when the caller did not pin one
    fn default_model(&self) -> &str;

    /// Send a completion request and normalize the response
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<AdapterResponse, AdapterError>;
}

/// Build the adapter for a configured provider
pub fn build_adapter(name: &str, config: &LlmProviderConfig) -> Arc<dyn ProviderAdapter> {
    match config.provider_type {
        LlmProviderType::Openai => Arc::new(openai::OpenAiAdapter::new(name.to_owned(), config)),
        LlmProviderType::Anthropic => Arc::new(anthropic::AnthropicAdapter::new(name.to_owned(), config)),
        LlmProviderType::Azure => Arc::new(azure::AzureAdapter::new(name.to_owned(), config)),
        LlmProviderType::Google => Arc::new(google::GoogleAdapter::new(name.to_owned(), config)),
    }
}

/// Per-attempt request deadline from provider config
pub(crate) const fn request_timeout(config: &LlmProviderConfig) -> Duration {
    Duration::from_secs(config.timeout_secs)
}

/// Map a reqwest failure to an adapter error
pub(crate) fn transport_error(provider: &str, error: &reqwest::Error) -> AdapterError {
    if error.is_timeout() {
        tracing::warn!(provider, "upstream request timed out");
        return AdapterError::Timeout;
    }
    tracing::error!(provider, error = %error, "upstream request failed");
    AdapterError::Transport(error.to_string())
}

/// Turn a non-success upstream response into an adapter error
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> AdapterError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = body.chars().take(512).collect::<String>();
    tracing::warn!(provider, status = %status, "upstream returned error");
    AdapterError::Status {
        status: status.as_u16(),
        detail,
    }
}
