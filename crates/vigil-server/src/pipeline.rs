//! The completion pipeline behind `POST /v1/complete`
//!
//! Stage order is load-bearing: redact, estimate, reserve, route,
//! settle, audit. Redaction runs before the estimate so the reservation
//! is priced on what actually leaves the gateway, and the reservation is
//! held as a guard so an abort at any later stage returns the funds.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use vigil_audit::{AttemptRecord, AuditEntry, AuditStatus};
use vigil_llm::RouteError;
use vigil_llm::types::{Attempt, AttemptClass, CompletionRequest, Message, RouteOutcome, Usage};
use vigil_pii::RedactionSummary;

use crate::auth::TeamIdentity;
use crate::error::GatewayError;
use crate::state::AppState;

/// Completion request payload
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteRequest {
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Provider to try first; fallback still applies
    #[serde(default)]
    pub provider: Option<String>,
    /// Model override for the first candidate
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Informational only; billing identity always comes from the API key
    #[serde(default)]
    pub team_id: Option<String>,
}

/// Upper bound on the completion budget a single request may claim
const MAX_TOKENS_CEILING: u32 = 8192;

#[allow(clippy::missing_const_for_fn)]
fn default_max_tokens() -> u32 {
    1024
}

#[allow(clippy::missing_const_for_fn)]
fn default_temperature() -> f64 {
    0.7
}

/// Completion response payload
#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub request_id: String,
    pub content: String,
    pub provider_used: String,
    pub model_used: String,
    pub usage: UsageBody,
    pub fallback_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub pii_summary: PiiBody,
    pub latency_ms: f64,
}

/// Token usage and cost section of the response
#[derive(Debug, Serialize)]
pub struct UsageBody {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub cost_usd: f64,
}

impl UsageBody {
    fn new(usage: Usage, cost_usd: f64) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens(),
            cost_usd,
        }
    }
}

/// Redaction section of the response
#[derive(Debug, Serialize)]
pub struct PiiBody {
    pub redacted: bool,
    pub entities_found: Vec<String>,
    pub redaction_count: usize,
}

/// Handle `POST /v1/complete`
pub async fn complete_handler(
    State(state): State<AppState>,
    axum::Extension(identity): axum::Extension<TeamIdentity>,
    Json(payload): Json<CompleteRequest>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let team_id = identity.0;

    match run_pipeline(&state, &request_id, &team_id, payload).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => error.into_response(),
    }
}

async fn run_pipeline(
    state: &AppState,
    request_id: &str,
    team_id: &str,
    payload: CompleteRequest,
) -> Result<CompleteResponse, GatewayError> {
    validate(state, &payload)?;
    let provider_requested = payload.provider.clone();

    // Redact before anything else sees the content
    let mut summary = RedactionSummary::default();
    let messages: Vec<Message> = payload
        .messages
        .into_iter()
        .map(|message| {
            let (content, pass) = state.redactor.redact(&message.content);
            summary.absorb(pass);
            Message {
                role: message.role,
                content,
            }
        })
        .collect();

    if summary.redacted {
        tracing::info!(
            request_id,
            team_id,
            entities = ?summary.entities_found,
            count = summary.redaction_count,
            "redacted PII from request"
        );
    }

    let request = CompletionRequest {
        messages,
        provider: payload.provider,
        model: payload.model,
        max_tokens: payload.max_tokens,
        temperature: payload.temperature,
    };

    // Price the reservation against the provider the request would reach
    let prompt_chars: usize = request.messages.iter().map(|m| m.content.len()).sum();
    let (est_provider, est_model) = state
        .router
        .primary_target(&request)
        .ok_or_else(|| GatewayError::Validation("no providers configured".to_owned()))?;
    let estimated_cost = state
        .prices
        .estimate(&est_provider, &est_model, prompt_chars, request.max_tokens);

    let reservation = match state.ledger.reserve(team_id, estimated_cost) {
        Ok(reservation) => reservation,
        Err(error) => {
            state.audit.record(budget_refusal_entry(
                request_id,
                team_id,
                provider_requested.clone(),
                &summary,
                &error,
            ));
            return Err(error.into());
        }
    };

    // From here the reservation guard returns the hold on any abort
    let outcome = match state.router.route(&request).await {
        Ok(outcome) => outcome,
        Err(error) => {
            drop(reservation);
            state.audit.record(routing_failure_entry(
                request_id,
                team_id,
                provider_requested.clone(),
                &summary,
                &error,
            ));
            return Err(error.into());
        }
    };

    let cost_usd = state
        .prices
        .actual(&outcome.provider_used, &outcome.model_used, outcome.usage);
    reservation.settle(cost_usd);

    state.audit.record(success_entry(
        request_id,
        team_id,
        provider_requested,
        &summary,
        &outcome,
        cost_usd,
    ));

    Ok(CompleteResponse {
        request_id: request_id.to_owned(),
        content: outcome.content,
        provider_used: outcome.provider_used,
        model_used: outcome.model_used,
        usage: UsageBody::new(outcome.usage, cost_usd),
        fallback_triggered: outcome.fallback_triggered,
        fallback_reason: outcome.fallback_reason,
        pii_summary: PiiBody {
            redacted: summary.redacted,
            entities_found: summary.entities_found,
            redaction_count: summary.redaction_count,
        },
        latency_ms: outcome.latency.as_secs_f64() * 1000.0,
    })
}

fn validate(state: &AppState, payload: &CompleteRequest) -> Result<(), GatewayError> {
    if payload.messages.is_empty() {
        return Err(GatewayError::Validation("messages must not be empty".to_owned()));
    }
    if payload.max_tokens == 0 || payload.max_tokens > MAX_TOKENS_CEILING {
        return Err(GatewayError::Validation(format!(
            "max_tokens must be between 1 and {MAX_TOKENS_CEILING}"
        )));
    }
    if !(0.0..=2.0).contains(&payload.temperature) {
        return Err(GatewayError::Validation(
            "temperature must be between 0.0 and 2.0".to_owned(),
        ));
    }
    if let Some(provider) = &payload.provider
        && !state.router.knows_provider(provider)
    {
        return Err(GatewayError::Validation(format!("unknown provider '{provider}'")));
    }
    Ok(())
}

const fn class_tag(class: AttemptClass) -> &'static str {
    match class {
        AttemptClass::Transient => "transient",
        AttemptClass::Permanent => "permanent",
        AttemptClass::CircuitOpen => "circuit_open",
    }
}

fn attempt_records(attempts: &[Attempt]) -> Vec<AttemptRecord> {
    attempts
        .iter()
        .map(|attempt| AttemptRecord {
            provider: attempt.provider.clone(),
            classification: class_tag(attempt.classification).to_owned(),
            detail: attempt.detail.clone(),
        })
        .collect()
}

fn base_entry(
    request_id: &str,
    team_id: &str,
    provider_requested: Option<String>,
    summary: &RedactionSummary,
) -> AuditEntry {
    AuditEntry {
        timestamp: AuditEntry::now_timestamp(),
        request_id: request_id.to_owned(),
        team_id: team_id.to_owned(),
        provider_requested,
        provider_used: None,
        model_used: None,
        prompt_tokens: 0,
        completion_tokens: 0,
        cost_usd: 0.0,
        pii_entities_redacted: summary.entities_found.clone(),
        pii_redaction_count: summary.redaction_count,
        latency_ms: 0.0,
        fallback_triggered: false,
        fallback_reason: None,
        attempts: Vec::new(),
        status: AuditStatus::Error,
        error_message: None,
    }
}

fn success_entry(
    request_id: &str,
    team_id: &str,
    provider_requested: Option<String>,
    summary: &RedactionSummary,
    outcome: &RouteOutcome,
    cost_usd: f64,
) -> AuditEntry {
    let mut entry = base_entry(request_id, team_id, provider_requested, summary);
    entry.provider_used = Some(outcome.provider_used.clone());
    entry.model_used = Some(outcome.model_used.clone());
    entry.prompt_tokens = outcome.usage.prompt_tokens;
    entry.completion_tokens = outcome.usage.completion_tokens;
    entry.cost_usd = cost_usd;
    entry.latency_ms = outcome.latency.as_secs_f64() * 1000.0;
    entry.fallback_triggered = outcome.fallback_triggered;
    entry.fallback_reason = outcome.fallback_reason.clone();
    entry.attempts = attempt_records(&outcome.attempts);
    entry.status = AuditStatus::Success;
    entry
}

fn budget_refusal_entry(
    request_id: &str,
    team_id: &str,
    provider_requested: Option<String>,
    summary: &RedactionSummary,
    error: &vigil_budget::BudgetError,
) -> AuditEntry {
    let mut entry = base_entry(request_id, team_id, provider_requested, summary);
    entry.status = AuditStatus::BudgetExceeded;
    entry.error_message = Some(error.to_string());
    entry
}

fn routing_failure_entry(
    request_id: &str,
    team_id: &str,
    provider_requested: Option<String>,
    summary: &RedactionSummary,
    error: &RouteError,
) -> AuditEntry {
    let mut entry = base_entry(request_id, team_id, provider_requested, summary);
    let RouteError::AllProvidersUnavailable { attempts } = error;
    entry.attempts = attempt_records(attempts);
    entry.status = AuditStatus::Error;
    entry.error_message = Some(error.to_string());
    entry
}
