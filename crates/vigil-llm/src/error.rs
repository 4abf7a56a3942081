use thiserror::Error;

use crate::types::Attempt;

/// Transient failures count toward the circuit breaker and indicate the
/// provider may recover; permanent failures indicate the request itself
/// was rejected. Both fall back to the next candidate, but the
/// distinction is preserved end to end for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
}

/// Errors raised by a provider adapter for one attempt
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Request exceeded the per-attempt timeout
    #[error("request timed out")]
    Timeout,

    /// Connection or transport failure before a response arrived
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("provider returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Provider answered 2xx but the body could not be interpreted
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl AdapterError {
    /// Classify this failure for the breaker and the attempt trail
    ///
    /// Timeouts, transport errors, rate limiting, and 5xx are transient;
    /// other 4xx (malformed request, auth rejection) are permanent.
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Timeout | Self::Transport(_) | Self::InvalidResponse(_) => FailureClass::Transient,
            Self::Status { status, .. } => match *status {
                408 | 429 => FailureClass::Transient,
                400..=499 => FailureClass::Permanent,
                _ => FailureClass::Transient,
            },
        }
    }
}

/// Routing failed for the whole candidate list
#[derive(Debug, Error)]
pub enum RouteError {
    /// Every candidate was skipped or failed; the trail says why
    #[error("all providers unavailable after {} attempts", attempts.len())]
    AllProvidersUnavailable { attempts: Vec<Attempt> },
}
