//! HTTP surface of the gateway
//!
//! Assembles the axum router, the API-key middleware, and the shared
//! subsystem state, and owns the serve loop with graceful shutdown.

mod auth;
mod error;
mod pipeline;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use vigil_auth::{StaticKeyResolver, TeamResolver};
use vigil_config::Config;

pub use auth::TeamIdentity;
pub use error::GatewayError;
pub use pipeline::{CompleteRequest, CompleteResponse};
pub use state::AppState;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        let state = AppState::from_config(config);

        let mut app = Router::new()
            .route("/v1/complete", axum::routing::post(pipeline::complete_handler))
            .route(
                "/v1/providers/status",
                axum::routing::get(routes::providers_status_handler),
            )
            .route("/v1/budget", axum::routing::get(routes::budget_all_handler))
            .route("/v1/budget/{team_id}", axum::routing::get(routes::budget_team_handler))
            .route("/v1/audit/recent", axum::routing::get(routes::audit_recent_handler));

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(routes::health_handler));
        }

        let mut app = app.with_state(state);

        if config.auth.enabled {
            let resolver: Arc<dyn TeamResolver> = Arc::new(StaticKeyResolver::from_config(&config.auth));
            let header_name = config.auth.header_name.clone();
            let public_paths = vec![config.server.health.path.clone()];
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let resolver = Arc::clone(&resolver);
                let header_name = header_name.clone();
                let public_paths = public_paths.clone();
                async move { auth::auth_middleware(resolver, header_name, public_paths, req, next).await }
            }));
        } else {
            // No auth: every request runs under a shared anonymous team
            app = app.layer(axum::middleware::from_fn(|mut req: axum::extract::Request, next: axum::middleware::Next| async move {
                req.extensions_mut().insert(TeamIdentity("anonymous".to_owned()));
                next.run(req).await
            }));
        }

        let app = app.layer(TraceLayer::new_for_http());

        Self {
            router: app,
            listen_address,
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
