use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `${env:VAR}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured, the priority list
    /// names an unknown provider, or limits are not positive
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_llm()?;
        self.validate_budget()?;
        self.validate_auth()?;
        Ok(())
    }

    fn validate_llm(&self) -> anyhow::Result<()> {
        if self.llm.providers.is_empty() {
            anyhow::bail!("at least one LLM provider must be configured");
        }

        for name in &self.llm.priority {
            if !self.llm.providers.contains_key(name) {
                anyhow::bail!("provider priority names unknown provider '{name}'");
            }
        }

        for (name, provider) in &self.llm.providers {
            // Azure endpoints are resource-scoped; there is no default
            if provider.provider_type == crate::LlmProviderType::Azure && provider.base_url.is_none() {
                anyhow::bail!("azure provider '{name}' requires base_url");
            }
        }

        if self.llm.circuit_breaker.failure_threshold == 0 {
            anyhow::bail!("llm.circuit_breaker.failure_threshold must be greater than 0");
        }

        for (provider, models) in &self.llm.pricing {
            for (model, price) in models {
                if price.input_per_1k < 0.0 || price.output_per_1k < 0.0 {
                    anyhow::bail!("pricing for '{provider}/{model}' must not be negative");
                }
            }
        }

        Ok(())
    }

    fn validate_budget(&self) -> anyhow::Result<()> {
        if self.budget.default_daily_limit_usd <= 0.0 || self.budget.default_monthly_limit_usd <= 0.0 {
            anyhow::bail!("default budget limits must be greater than 0");
        }

        for (team, limits) in &self.budget.teams {
            if limits.daily_limit_usd <= 0.0 || limits.monthly_limit_usd <= 0.0 {
                anyhow::bail!("budget limits for team '{team}' must be greater than 0");
            }
        }

        Ok(())
    }

    fn validate_auth(&self) -> anyhow::Result<()> {
        if self.auth.enabled && self.auth.keys.is_empty() {
            anyhow::bail!("auth.keys must not be empty when auth is enabled");
        }
        Ok(())
    }
}
