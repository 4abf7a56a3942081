//! Per-team budget ledger
//!
//! Tracks daily and monthly USD spend per team with a reserve/settle
//! protocol: a conservative reservation is taken before any provider is
//! contacted and corrected to the actual cost afterwards. The reservation
//! is the atomicity boundary: two concurrent reservations for the same
//! team can never both pass a check against a stale spent value.

mod error;
mod ledger;

pub use error::{BudgetError, LimitScope};
pub use ledger::{BudgetLedger, BudgetStatus, Reservation};
