use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use vigil_auth::{AuthError, TeamResolver};

use crate::error::GatewayError;

/// Team identity resolved from the request's API key
///
/// Inserted as a request extension; the payload never carries identity.
#[derive(Debug, Clone)]
pub struct TeamIdentity(pub String);

/// Authenticate requests via the gateway API key header
///
/// Public paths (health) pass through without an identity. Everything
/// else must present a key the resolver recognizes.
pub async fn auth_middleware(
    resolver: Arc<dyn TeamResolver>,
    header_name: String,
    public_paths: Vec<String>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if public_paths.iter().any(|p| path == p) {
        return next.run(request).await;
    }

    let key = request
        .headers()
        .get(header_name.as_str())
        .and_then(|v| v.to_str().ok());

    let Some(key) = key else {
        return GatewayError::MissingApiKey.into_response();
    };

    match resolver.resolve(key) {
        Ok(team_id) => {
            let mut request = request;
            request.extensions_mut().insert(TeamIdentity(team_id));
            next.run(request).await
        }
        Err(AuthError::MissingKey) => GatewayError::MissingApiKey.into_response(),
        Err(AuthError::InvalidKey) => {
            tracing::warn!(path, "request presented an unrecognized API key");
            GatewayError::InvalidApiKey.into_response()
        }
    }
}
