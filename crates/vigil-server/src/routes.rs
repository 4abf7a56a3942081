//! Read-only operational endpoints

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use vigil_audit::AuditEntry;
use vigil_budget::BudgetStatus;
use vigil_llm::ProviderHealthSnapshot;

use crate::state::AppState;

/// Handle `GET /health`
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Response body for `GET /v1/providers/status`
#[derive(Debug, Serialize)]
pub struct ProvidersStatusBody {
    pub providers: Vec<ProviderHealthSnapshot>,
}

/// Handle `GET /v1/providers/status`
pub async fn providers_status_handler(State(state): State<AppState>) -> Json<ProvidersStatusBody> {
    Json(ProvidersStatusBody {
        providers: state.router.health().snapshot(),
    })
}

/// Handle `GET /v1/budget`
pub async fn budget_all_handler(State(state): State<AppState>) -> Json<Vec<BudgetStatus>> {
    Json(state.ledger.all_teams())
}

/// Handle `GET /v1/budget/{team_id}`
///
/// Teams with no recorded spend report zero against the default limits.
pub async fn budget_team_handler(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Json<BudgetStatus> {
    Json(state.ledger.status(&team_id))
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    #[serde(default = "default_limit")]
    limit: usize,
}

#[allow(clippy::missing_const_for_fn)]
fn default_limit() -> usize {
    50
}

/// Handle `GET /v1/audit/recent`
pub async fn audit_recent_handler(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Json<Vec<AuditEntry>> {
    Json(state.audit.recent(params.limit))
}
