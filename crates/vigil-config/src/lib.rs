#![allow(clippy::must_use_candidate)]

pub mod audit;
pub mod auth;
pub mod budget;
mod env;
pub mod llm;
mod loader;
pub mod pii;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use audit::*;
pub use auth::*;
pub use budget::*;
pub use llm::*;
pub use pii::*;
pub use server::*;
pub use telemetry::*;

/// Top-level Vigil configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// API-key authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Per-team budget limits
    #[serde(default)]
    pub budget: BudgetConfig,
    /// PII redaction
    #[serde(default)]
    pub pii: PiiConfig,
    /// Audit logging
    #[serde(default)]
    pub audit: AuditConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
