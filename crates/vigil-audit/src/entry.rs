use serde::{Deserialize, Serialize};

/// Final disposition of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Completion returned to the caller
    Success,
    /// Request aborted by the budget gate
    BudgetExceeded,
    /// Request failed after the budget gate
    Error,
}

/// One provider attempt within a request, with its failure classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider: String,
    /// Classification tag: `transient`, `permanent`, or `circuit_open`
    pub classification: String,
    pub detail: String,
}

/// Audit record for a single gateway request, metadata only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub request_id: String,
    pub team_id: String,
    pub provider_requested: Option<String>,
    pub provider_used: Option<String>,
    pub model_used: Option<String>,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub cost_usd: f64,
    pub pii_entities_redacted: Vec<String>,
    pub pii_redaction_count: usize,
    pub latency_ms: f64,
    pub fallback_triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Providers attempted before the outcome, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<AttemptRecord>,
    pub status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditEntry {
    /// Current wall-clock time in RFC 3339 UTC, for `timestamp`
    pub fn now_timestamp() -> String {
        jiff::Timestamp::now().to_string()
    }
}
