//! Google Generative Language API adapter

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

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when the config does not name one
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google Generative Language API adapter
pub struct GoogleAdapter {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    default_model: String,
    timeout: Duration,
}

impl GoogleAdapter {
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

    /// Build the `generateContent` endpoint URL for a model
    fn generate_url(&self, model: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{model}:generateContent")
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
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
        let system_text = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let wire_request = GenerateRequest {
            system_instruction: (!system_text.is_empty()).then(|| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system_text }],
            }),
            contents: messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(GeminiContent::from)
                .collect(),
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature,
            },
        };

        let mut builder = self
            .client
            .post(self.generate_url(model))
            .timeout(self.timeout)
            .json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.header("x-goog-api-key", key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| super::transport_error(&self.name, &e))?;

        if !response.status().is_success() {
            return Err(super::status_error(&self.name, response).await);
        }

        let wire_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        let candidate = wire_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::InvalidResponse("response contained no candidates".to_owned()))?;

        let content = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        let usage = wire_response.usage_metadata.map_or_else(Usage::default, |m| Usage {
            prompt_tokens: m.prompt_token_count,
            completion_tokens: m.candidates_token_count,
        });

        Ok(AdapterResponse {
            content,
            model_used: model.to_owned(),
            usage,
        })
    }
}

// -- Wire format --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl From<&Message> for GeminiContent {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::Assistant => "model",
            Role::User | Role::System => "user",
        };
        Self {
            role: Some(role.to_owned()),
            parts: vec![GeminiPart {
                text: message.content.clone(),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
