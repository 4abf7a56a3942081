use indexmap::IndexMap;
use serde::Deserialize;

/// Per-team budget configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Daily limit applied to teams without an explicit entry
    #[serde(default = "default_daily")]
    pub default_daily_limit_usd: f64,
    /// Monthly limit applied to teams without an explicit entry
    #[serde(default = "default_monthly")]
    pub default_monthly_limit_usd: f64,
    /// Explicit per-team limits
    #[serde(default)]
    pub teams: IndexMap<String, TeamLimits>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            default_daily_limit_usd: default_daily(),
            default_monthly_limit_usd: default_monthly(),
            teams: IndexMap::new(),
        }
    }
}

/// Budget limits for a single team
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamLimits {
    pub daily_limit_usd: f64,
    pub monthly_limit_usd: f64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_daily() -> f64 {
    10.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_monthly() -> f64 {
    200.0
}
