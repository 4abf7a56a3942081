use std::ops::Deref;
use std::sync::Arc;

use vigil_audit::AuditLog;
use vigil_budget::BudgetLedger;
use vigil_config::Config;
use vigil_llm::{PriceTable, ProviderRouter};
use vigil_pii::Redactor;

/// Shared state behind every route handler
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

pub struct StateInner {
    pub router: ProviderRouter,
    pub ledger: BudgetLedger,
    pub redactor: Redactor,
    pub audit: AuditLog,
    pub prices: PriceTable,
}

impl AppState {
    /// Construct every subsystem from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            inner: Arc::new(StateInner {
                router: ProviderRouter::from_config(&config.llm),
                ledger: BudgetLedger::from_config(&config.budget),
                redactor: Redactor::from_config(&config.pii),
                audit: AuditLog::spawn(&config.audit),
                prices: PriceTable::from_config(&config.llm.pricing),
            }),
        }
    }
}

impl Deref for AppState {
    type Target = StateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
