//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::PathBuf;

use secrecy::SecretString;
use vigil_config::{CircuitBreakerConfig, Config, LlmProviderConfig, LlmProviderType, ServerConfig, TeamLimits};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal defaults: auth disabled, everything else stock
    pub fn new() -> Self {
        let mut config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                ..ServerConfig::default()
            },
            ..Config::default()
        };
        config.auth.enabled = false;
        Self { config }
    }

    /// Add an OpenAI-compatible provider pointed at a mock backend
    pub fn with_openai_provider(mut self, name: &str, base_url: &str) -> Self {
        self.config.llm.providers.insert(
            name.to_owned(),
            LlmProviderConfig {
                provider_type: LlmProviderType::Openai,
                api_key: Some(SecretString::from("test-key")),
                base_url: Some(base_url.parse().expect("valid URL")),
                default_model: Some("mock-model".to_owned()),
                api_version: None,
                timeout_secs: 5,
            },
        );
        self
    }

    /// Set the fallback priority order
    pub fn with_priority(mut self, providers: &[&str]) -> Self {
        self.config.llm.priority = providers.iter().map(|p| (*p).to_owned()).collect();
        self
    }

    /// Enable API-key auth with a single key/team pair
    pub fn with_api_key(mut self, key: &str, team: &str) -> Self {
        self.config.auth.enabled = true;
        self.config.auth.keys.insert(key.to_owned(), team.to_owned());
        self
    }

    /// Set default budget limits
    pub fn with_budget(mut self, daily: f64, monthly: f64) -> Self {
        self.config.budget.default_daily_limit_usd = daily;
        self.config.budget.default_monthly_limit_usd = monthly;
        self
    }

    /// Set explicit limits for one team
    pub fn with_team_limits(mut self, team: &str, daily: f64, monthly: f64) -> Self {
        self.config.budget.teams.insert(
            team.to_owned(),
            TeamLimits {
                daily_limit_usd: daily,
                monthly_limit_usd: monthly,
            },
        );
        self
    }

    /// Tune the circuit breaker
    pub fn with_circuit_breaker(mut self, failure_threshold: u32, cooldown_secs: u64) -> Self {
        self.config.llm.circuit_breaker = CircuitBreakerConfig {
            failure_threshold,
            cooldown_secs,
        };
        self
    }

    /// Disable PII redaction
    pub fn without_pii(mut self) -> Self {
        self.config.pii.enabled = false;
        self
    }

    /// Append audit entries to a JSONL file
    pub fn with_audit_file(mut self, path: PathBuf) -> Self {
        self.config.audit.log_file = Some(path);
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
