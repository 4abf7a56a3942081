//! Azure OpenAI adapter
//!
//! Speaks the OpenAI chat completions wire format, but endpoints are
//! scoped to a resource and a deployment: the model name selects the
//! deployment path segment, authentication uses the `api-key` header,
//! and every request carries an `api-version` query parameter.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;
use vigil_config::LlmProviderConfig;

use super::ProviderAdapter;
use super::openai::{ChatMessage, ChatRequest, ChatResponse};
use crate::error::AdapterError;
use crate::types::{AdapterResponse, Message};

/// API version used when the config does not pin one
const DEFAULT_API_VERSION: &str = "2024-06-01";

/// Deployment used when the config does not name one
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Azure OpenAI adapter
pub struct AzureAdapter {
    name: String,
    client: Client,
    base_url: Option<Url>,
    api_key: Option<SecretString>,
    api_version: String,
    default_model: String,
    timeout: Duration,
}

impl AzureAdapter {
    /// Create from provider configuration
    ///
    /// Config validation requires `base_url` for Azure providers; the
    /// resource endpoint has no public default.
    pub fn new(name: String, config: &LlmProviderConfig) -> Self {
        Self {
            name,
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_version: config
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_owned()),
            default_model: config.default_model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            timeout: super::request_timeout(config),
        }
    }

    /// Build the deployment-scoped chat completions URL
    fn completions_url(&self, base_url: &Url, deployment: &str) -> String {
        let base = base_url.as_str().trim_end_matches('/');
        format!(
            "{base}/openai/deployments/{deployment}/chat/completions?api-version={}",
            self.api_version
        )
    }
}

#[async_trait]
impl ProviderAdapter for AzureAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<AdapterResponse, AdapterError> {
        let Some(base_url) = &self.base_url else {
            return Err(AdapterError::Transport("no base_url configured".to_owned()));
        };

        let wire_request = ChatRequest {
            model,
            messages: messages.iter().map(ChatMessage::from).collect(),
            max_tokens,
            temperature,
        };

        let mut builder = self
            .client
            .post(self.completions_url(base_url, model))
            .timeout(self.timeout)
            .json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| super::transport_error(&self.name, &e))?;

        if !response.status().is_success() {
            return Err(super::status_error(&self.name, response).await);
        }

        let wire_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        let choice = wire_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::InvalidResponse("response contained no choices".to_owned()))?;

        Ok(AdapterResponse {
            content: choice.message.content.unwrap_or_default(),
            model_used: wire_response.model,
            usage: wire_response.usage.map(Into::into).unwrap_or_default(),
        })
    }
}
