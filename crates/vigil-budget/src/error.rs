use thiserror::Error;

/// Which budget window rejected a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitScope {
    Daily,
    Monthly,
}

impl std::fmt::Display for LimitScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

/// Errors returned by the budget ledger
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Reserving the estimated cost would exceed a team limit
    #[error("{scope} budget exceeded for team '{team_id}': ${spent:.4} spent of ${limit:.2} limit")]
    Exceeded {
        team_id: String,
        scope: LimitScope,
        spent: f64,
        limit: f64,
        estimated: f64,
    },
}
