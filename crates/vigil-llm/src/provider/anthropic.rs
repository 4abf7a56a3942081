//! Anthropic Messages API adapter

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use vigil_config::LlmProviderConfig;

use super::ProviderAdapter;
use crate::error::AdapterError;
use crate::types::{AdapterResponse, Message, Role, Usage};

/// Default Anthropic API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Model used when the config does not name one
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Anthropic Messages API adapter
pub struct AnthropicAdapter {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    default_model: String,
    timeout: Duration,
}

impl AnthropicAdapter {
    /// Create from provider configuration
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    pub fn new(name: String, config: &LlmProviderConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Self {
            name,
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            default_model: config.default_model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            timeout: super::request_timeout(config),
        }
    }

    /// Build the messages endpoint URL
    fn messages_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/messages")
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
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
        // System messages ride in a dedicated top-level field
        let system = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let wire_messages = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(MessagesEntry::from)
            .collect();

        let wire_request = MessagesRequest {
            model,
            system: (!system.is_empty()).then_some(system),
            messages: wire_messages,
            max_tokens,
            temperature,
        };

        let mut builder = self
            .client
            .post(self.messages_url())
            .timeout(self.timeout)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| super::transport_error(&self.name, &e))?;

        if !response.status().is_success() {
            return Err(super::status_error(&self.name, response).await);
        }

        let wire_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        let content = wire_response
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        Ok(AdapterResponse {
            content,
            model_used: wire_response.model,
            usage: Usage {
                prompt_tokens: wire_response.usage.input_tokens,
                completion_tokens: wire_response.usage.output_tokens,
            },
        })
    }
}

// -- Wire format --

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<MessagesEntry>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct MessagesEntry {
    role: String,
    content: String,
}

impl From<&Message> for MessagesEntry {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::Assistant => "assistant",
            Role::User | Role::System => "user",
        };
        Self {
            role: role.to_owned(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    usage: MessagesUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}
