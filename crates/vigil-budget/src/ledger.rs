use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use jiff::Zoned;
use jiff::civil::Date;
use vigil_config::BudgetConfig;

use crate::error::{BudgetError, LimitScope};

/// Per-team spend counters and limits
struct TeamAccount {
    daily_limit_usd: f64,
    monthly_limit_usd: f64,
    daily_spent_usd: f64,
    monthly_spent_usd: f64,
    requests_today: u64,
    requests_this_month: u64,
    daily_period: Date,
    monthly_period: (i16, i8),
}

impl TeamAccount {
    fn new(daily_limit_usd: f64, monthly_limit_usd: f64, today: Date) -> Self {
        Self {
            daily_limit_usd,
            monthly_limit_usd,
            daily_spent_usd: 0.0,
            monthly_spent_usd: 0.0,
            requests_today: 0,
            requests_this_month: 0,
            daily_period: today,
            monthly_period: (today.year(), today.month()),
        }
    }

    /// Reset spend counters for any window the clock has left
    fn roll_over(&mut self, today: Date) {
        if self.daily_period != today {
            self.daily_period = today;
            self.daily_spent_usd = 0.0;
            self.requests_today = 0;
        }
        let month = (today.year(), today.month());
        if self.monthly_period != month {
            self.monthly_period = month;
            self.monthly_spent_usd = 0.0;
            self.requests_this_month = 0;
        }
    }

    /// Apply a signed correction to both spend counters, flooring at zero
    fn adjust(&mut self, delta: f64) {
        self.daily_spent_usd = (self.daily_spent_usd + delta).max(0.0);
        self.monthly_spent_usd = (self.monthly_spent_usd + delta).max(0.0);
    }
}

struct LedgerInner {
    teams: DashMap<String, Mutex<TeamAccount>>,
    default_daily_limit_usd: f64,
    default_monthly_limit_usd: f64,
}

/// Thread-safe budget ledger, sharded per team
///
/// Cloning is cheap and shares the underlying store. Each team's
/// read-modify-write sequence runs under that team's own mutex, so
/// unrelated teams never contend.
#[derive(Clone)]
pub struct BudgetLedger {
    inner: Arc<LedgerInner>,
}

impl BudgetLedger {
    /// Build the ledger from configuration, seeding explicitly
    /// provisioned teams
    pub fn from_config(config: &BudgetConfig) -> Self {
        let ledger = Self {
            inner: Arc::new(LedgerInner {
                teams: DashMap::new(),
                default_daily_limit_usd: config.default_daily_limit_usd,
                default_monthly_limit_usd: config.default_monthly_limit_usd,
            }),
        };

        for (team_id, limits) in &config.teams {
            ledger.set_limits(team_id, limits.daily_limit_usd, limits.monthly_limit_usd);
        }

        ledger
    }

    /// Reserve `estimated_cost` against both budget windows
    ///
    /// Performs an atomic check-and-increment: after lazily rolling over
    /// expired periods, the reservation succeeds only if both windows can
    /// absorb the full estimate, and on success increments both spent
    /// counters before releasing the team's lock.
    ///
    /// The returned [`Reservation`] releases itself on drop unless it is
    /// settled, so an aborted pipeline never leaks reserved budget.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::Exceeded`] naming the violated window; in
    /// that case nothing is mutated beyond the rollover.
    pub fn reserve(&self, team_id: &str, estimated_cost: f64) -> Result<Reservation, BudgetError> {
        let today = today();
        let entry = self.entry(team_id, today);
        let mut account = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        account.roll_over(today);

        if account.daily_spent_usd + estimated_cost > account.daily_limit_usd {
            return Err(BudgetError::Exceeded {
                team_id: team_id.to_owned(),
                scope: LimitScope::Daily,
                spent: account.daily_spent_usd,
                limit: account.daily_limit_usd,
                estimated: estimated_cost,
            });
        }
        if account.monthly_spent_usd + estimated_cost > account.monthly_limit_usd {
            return Err(BudgetError::Exceeded {
                team_id: team_id.to_owned(),
                scope: LimitScope::Monthly,
                spent: account.monthly_spent_usd,
                limit: account.monthly_limit_usd,
                estimated: estimated_cost,
            });
        }

        account.adjust(estimated_cost);
        drop(account);

        Ok(Reservation {
            ledger: self.clone(),
            team_id: team_id.to_owned(),
            estimated_cost,
            armed: true,
        })
    }

    /// Current budget status for a team, creating it with default limits
    /// on first reference
    pub fn status(&self, team_id: &str) -> BudgetStatus {
        let today = today();
        let entry = self.entry(team_id, today);
        let mut account = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        account.roll_over(today);

        BudgetStatus {
            team_id: team_id.to_owned(),
            daily_spent: account.daily_spent_usd,
            daily_limit: account.daily_limit_usd,
            monthly_spent: account.monthly_spent_usd,
            monthly_limit: account.monthly_limit_usd,
            daily_remaining: (account.daily_limit_usd - account.daily_spent_usd).max(0.0),
            monthly_remaining: (account.monthly_limit_usd - account.monthly_spent_usd).max(0.0),
            requests_today: account.requests_today,
        }
    }

    /// Status for every known team
    pub fn all_teams(&self) -> Vec<BudgetStatus> {
        let ids: Vec<String> = self.inner.teams.iter().map(|e| e.key().clone()).collect();
        ids.iter().map(|id| self.status(id)).collect()
    }

    /// Provision or update a team's limits, preserving accumulated spend
    pub fn set_limits(&self, team_id: &str, daily_limit_usd: f64, monthly_limit_usd: f64) {
        let entry = self.entry(team_id, today());
        let mut account = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        account.daily_limit_usd = daily_limit_usd;
        account.monthly_limit_usd = monthly_limit_usd;
    }

    fn entry(&self, team_id: &str, today: Date) -> dashmap::mapref::one::Ref<'_, String, Mutex<TeamAccount>> {
        if let Some(existing) = self.inner.teams.get(team_id) {
            return existing;
        }
        self.inner
            .teams
            .entry(team_id.to_owned())
            .or_insert_with(|| {
                Mutex::new(TeamAccount::new(
                    self.inner.default_daily_limit_usd,
                    self.inner.default_monthly_limit_usd,
                    today,
                ))
            })
            .downgrade()
    }

    /// Apply a settlement correction and count a committed request
    fn commit(&self, team_id: &str, delta: f64, committed: bool) {
        let today = today();
        let entry = self.entry(team_id, today);
        let mut account = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        account.roll_over(today);
        account.adjust(delta);
        if committed {
            account.requests_today += 1;
            account.requests_this_month += 1;
        }
    }

    /// Backdate a team's periods, simulating clock progression
    #[cfg(test)]
    fn backdate(&self, team_id: &str, daily: Date, monthly: (i16, i8)) {
        let entry = self.entry(team_id, today());
        let mut account = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        account.daily_period = daily;
        account.monthly_period = monthly;
    }
}

/// Snapshot of a team's budget, served by the budget endpoints
#[derive(Debug, Clone, serde::Serialize)]
pub struct BudgetStatus {
    pub team_id: String,
    pub daily_spent: f64,
    pub daily_limit: f64,
    pub monthly_spent: f64,
    pub monthly_limit: f64,
    pub daily_remaining: f64,
    pub monthly_remaining: f64,
    pub requests_today: u64,
}

/// A provisional budget hold
///
/// Must be settled with the actual cost once it is known, or released.
/// Dropping an unsettled reservation releases it.
#[must_use = "an unsettled reservation releases itself on drop"]
pub struct Reservation {
    ledger: BudgetLedger,
    team_id: String,
    estimated_cost: f64,
    armed: bool,
}

impl Reservation {
    /// The amount held by this reservation
    pub const fn estimated_cost(&self) -> f64 {
        self.estimated_cost
    }

    /// Correct the hold to the actual cost and count the request
    ///
    /// The correction may be negative; the ledger floors counters at zero
    /// so cumulative underestimation elsewhere can never drive a counter
    /// below zero.
    pub fn settle(mut self, actual_cost: f64) {
        self.ledger.commit(&self.team_id, actual_cost - self.estimated_cost, true);
        self.armed = false;
    }

    /// Return the full hold without counting a request
    pub fn release(self) {
        // Drop performs the release
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.armed {
            self.ledger.commit(&self.team_id, -self.estimated_cost, false);
            tracing::debug!(team_id = %self.team_id, amount = self.estimated_cost, "budget reservation released");
        }
    }
}

fn today() -> Date {
    Zoned::now().date()
}
