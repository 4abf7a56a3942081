use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use vigil_budget::BudgetError;
use vigil_core::HttpError;
use vigil_llm::RouteError;

/// Request-level errors surfaced to API consumers
///
/// Every variant maps to a status code and a stable machine-readable
/// `kind`, so clients can branch without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No API key presented
    #[error("missing API key")]
    MissingApiKey,

    /// Presented key resolves to no team
    #[error("invalid API key")]
    InvalidApiKey,

    /// Request payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Budget gate refused the request
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Every provider candidate was skipped or failed
    #[error(transparent)]
    Routing(#[from] RouteError),

    /// Unexpected internal failure
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl HttpError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingApiKey => StatusCode::UNAUTHORIZED,
            Self::InvalidApiKey => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Budget(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Routing(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_kind(&self) -> &str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::InvalidApiKey => "invalid_api_key",
            Self::Validation(_) => "validation",
            Self::Budget(_) => "budget_exceeded",
            Self::Routing(_) => "all_providers_unavailable",
            Self::Internal(_) => "internal",
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Internal details never leave the gateway
            Self::Internal(_) => "internal error".to_owned(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = serde_json::json!({
            "error": {
                "kind": self.error_kind(),
                "message": self.client_message(),
            }
        });

        // Exhausted routing carries the attempt trail for diagnostics
        if let Self::Routing(RouteError::AllProvidersUnavailable { attempts }) = &self
            && let Ok(trail) = serde_json::to_value(attempts)
        {
            body["error"]["attempts"] = trail;
        }

        (status, Json(body)).into_response()
    }
}
