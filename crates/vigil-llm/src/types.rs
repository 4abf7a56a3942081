//! Canonical request and outcome types shared by the router and adapters

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FailureClass;

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
}

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Internal routed completion request
///
/// Built by the pipeline after auth and redaction; carries only the
/// redacted message content.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    /// Explicit provider override; tried first when present
    pub provider: Option<String>,
    /// Requested model; candidates past the first use their own default
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Token usage reported by a provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub const fn total_tokens(self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Normalized response from a provider adapter
#[derive(Debug, Clone)]
pub struct AdapterResponse {
    pub content: String,
    pub model_used: String,
    pub usage: Usage,
}

/// One failed or skipped candidate within a routed request
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub provider: String,
    /// `transient`, `permanent`, or `circuit_open`
    pub classification: AttemptClass,
    pub detail: String,
}

/// Why a candidate did not produce a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptClass {
    /// Adapter failed with a transient error (timeout, 5xx, rate limit)
    Transient,
    /// Adapter failed with a permanent error (bad request, auth rejection)
    Permanent,
    /// Candidate skipped without an adapter call; breaker was open
    CircuitOpen,
}

impl From<FailureClass> for AttemptClass {
    fn from(class: FailureClass) -> Self {
        match class {
            FailureClass::Transient => Self::Transient,
            FailureClass::Permanent => Self::Permanent,
        }
    }
}

/// Successful routing result
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub provider_used: String,
    pub model_used: String,
    pub content: String,
    pub usage: Usage,
    /// True when any earlier candidate was skipped or failed
    pub fallback_triggered: bool,
    pub fallback_reason: Option<String>,
    /// Candidates that did not serve the request, in attempt order
    pub attempts: Vec<Attempt>,
    pub latency: Duration,
}
