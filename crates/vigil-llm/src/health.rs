//! Per-provider circuit breaker
//!
//! Keeps live traffic away from a provider in sustained failure while
//! still probing for recovery. Three states per provider: CLOSED (calls
//! flow), OPEN (calls refused until the cooldown elapses), HALF_OPEN
//! (exactly one trial call in flight). The trial is granted to a single
//! caller even under concurrent load.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use vigil_config::CircuitBreakerConfig;

/// Circuit breaker state for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, requests flow through
    Closed,
    /// Provider is failing, requests are refused
    Open,
    /// Probing, exactly one trial request is out
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { opened_at: Instant },
    HalfOpen { since: Instant },
}

#[derive(Debug)]
struct Health {
    consecutive_failures: u32,
    phase: Phase,
}

impl Health {
    const fn new() -> Self {
        Self {
            consecutive_failures: 0,
            phase: Phase::Closed,
        }
    }
}

/// Point-in-time view of one provider's breaker, for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealthSnapshot {
    pub provider_id: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// RFC 3339 moment the cooldown ends, present only while OPEN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<String>,
}

/// Registry of breaker state for every configured provider
pub struct HealthRegistry {
    providers: DashMap<String, Mutex<Health>>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl HealthRegistry {
    /// Initialize every named provider CLOSED
    pub fn new(config: &CircuitBreakerConfig, provider_ids: impl IntoIterator<Item = String>) -> Self {
        let providers = DashMap::new();
        for id in provider_ids {
            providers.insert(id, Mutex::new(Health::new()));
        }
        Self {
            providers,
            failure_threshold: config.failure_threshold,
            cooldown: Duration::from_secs(config.cooldown_secs),
        }
    }

    /// Ask to send one request to a provider
    ///
    /// CLOSED grants immediately. OPEN refuses until the cooldown has
    /// elapsed; the first caller after that transitions the provider to
    /// HALF_OPEN and receives the single trial slot. While a trial is
    /// out, every other caller is refused; a trial abandoned without an
    /// outcome is reclaimed after another full cooldown.
    pub fn try_acquire(&self, provider_id: &str) -> bool {
        let Some(entry) = self.providers.get(provider_id) else {
            return false;
        };
        let mut health = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        match health.phase {
            Phase::Closed => true,
            Phase::Open { opened_at } if opened_at.elapsed() >= self.cooldown => {
                health.phase = Phase::HalfOpen { since: Instant::now() };
                tracing::info!(provider = provider_id, "circuit breaker half-open, granting trial request");
                true
            }
            Phase::HalfOpen { since } if since.elapsed() >= self.cooldown => {
                // Stale trial never reported back; grant a fresh one
                health.phase = Phase::HalfOpen { since: Instant::now() };
                true
            }
            Phase::Open { .. } | Phase::HalfOpen { .. } => false,
        }
    }

    /// Report the outcome of a granted request
    pub fn record_outcome(&self, provider_id: &str, success: bool) {
        let Some(entry) = self.providers.get(provider_id) else {
            return;
        };
        let mut health = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        if success {
            // Any transition into CLOSED resets the failure count
            health.consecutive_failures = 0;
            if !matches!(health.phase, Phase::Closed) {
                tracing::info!(provider = provider_id, "circuit breaker closed");
            }
            health.phase = Phase::Closed;
            return;
        }

        health.consecutive_failures += 1;
        match health.phase {
            Phase::Closed if health.consecutive_failures >= self.failure_threshold => {
                health.phase = Phase::Open { opened_at: Instant::now() };
                tracing::warn!(
                    provider = provider_id,
                    consecutive_failures = health.consecutive_failures,
                    "circuit breaker opened"
                );
            }
            Phase::HalfOpen { .. } => {
                // Failed trial restarts the cooldown
                health.phase = Phase::Open { opened_at: Instant::now() };
                tracing::warn!(provider = provider_id, "trial request failed, circuit breaker reopened");
            }
            Phase::Closed | Phase::Open { .. } => {}
        }
    }

    /// Current state of every provider
    pub fn snapshot(&self) -> Vec<ProviderHealthSnapshot> {
        self.providers
            .iter()
            .map(|entry| {
                let health = entry.value().lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                let (state, cooldown_until) = match health.phase {
                    Phase::Closed => (CircuitState::Closed, None),
                    Phase::HalfOpen { .. } => (CircuitState::HalfOpen, None),
                    Phase::Open { opened_at } => {
                        let remaining = self.cooldown.saturating_sub(opened_at.elapsed());
                        let until = jiff::Timestamp::now()
                            .checked_add(jiff::SignedDuration::try_from(remaining).unwrap_or(jiff::SignedDuration::ZERO))
                            .map(|t| t.to_string())
                            .ok();
                        (CircuitState::Open, until)
                    }
                };
                ProviderHealthSnapshot {
                    provider_id: entry.key().clone(),
                    state,
                    consecutive_failures: health.consecutive_failures,
                    cooldown_until,
                }
            })
            .collect()
    }

    /// Current state for one provider, CLOSED if unknown
    pub fn state(&self, provider_id: &str) -> CircuitState {
        self.providers.get(provider_id).map_or(CircuitState::Closed, |entry| {
            let health = entry.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            match health.phase {
                Phase::Closed => CircuitState::Closed,
                Phase::Open { .. } => CircuitState::Open,
                Phase::HalfOpen { .. } => CircuitState::HalfOpen,
            }
        })
    }

    /// Rewind an OPEN or HALF_OPEN timer, simulating elapsed cooldown
    #[cfg(test)]
    fn backdate(&self, provider_id: &str, by: Duration) {
        let entry = self.providers.get(provider_id).expect("provider registered");
        let mut health = entry.lock().unwrap();
        health.phase = match health.phase {
            Phase::Open { opened_at } => Phase::Open {
                opened_at: opened_at - by,
            },
            Phase::HalfOpen { since } => Phase::HalfOpen { since: since - by },
            Phase::Closed => Phase::Closed,
        };
    }
}
