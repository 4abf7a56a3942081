//! Provider adapters, health tracking, and request routing
//!
//! The router owns the fallback policy: it builds a candidate order,
//! consults the per-provider circuit breaker, and walks the candidates
//! until one returns a completion. Provider specifics live behind the
//! [`provider::ProviderAdapter`] trait, so adding a provider never
//! touches the router.

mod error;
pub mod health;
pub mod pricing;
pub mod provider;
mod router;
pub mod types;

pub use error::{AdapterError, FailureClass, RouteError};
pub use health::{CircuitState, HealthRegistry, ProviderHealthSnapshot};
pub use pricing::PriceTable;
pub use router::ProviderRouter;
