//! OpenAI-compatible chat completions adapter

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

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when the config does not name one
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible provider adapter
pub struct OpenAiAdapter {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    default_model: String,
    timeout: Duration,
}

impl OpenAiAdapter {
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

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
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
        let wire_request = ChatRequest {
            model,
            messages: messages.iter().map(ChatMessage::from).collect(),
            max_tokens,
            temperature,
        };

        let mut builder = self
            .client
            .post(self.completions_url())
            .timeout(self.timeout)
            .json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
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

// -- Wire format, shared with the Azure adapter --

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest<'a> {
    pub(super) model: &'a str,
    pub(super) messages: Vec<ChatMessage>,
    pub(super) max_tokens: u32,
    pub(super) temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ChatMessage {
    pub(super) role: String,
    #[serde(default)]
    pub(super) content: Option<String>,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.to_owned(),
            content: Some(message.content.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    pub(super) model: String,
    pub(super) choices: Vec<ChatChoice>,
    #[serde(default)]
    pub(super) usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatChoice {
    pub(super) message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatUsage {
    pub(super) prompt_tokens: u32,
    pub(super) completion_tokens: u32,
}

impl From<ChatUsage> for Usage {
    fn from(usage: ChatUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        }
    }
}
