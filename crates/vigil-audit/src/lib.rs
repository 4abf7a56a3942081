//! Metadata-only audit logging
//!
//! Every gateway request produces one [`AuditEntry`]: who, when, which
//! provider, token counts, cost, PII summary. Raw prompt or completion
//! content is never recorded. Entries land in a bounded in-memory ring
//! (serving the recent-entries endpoint) and are shipped to an optional
//! JSONL file and SIEM webhook by a background task, so emission never
//! blocks a request and sink failure never alters a response.

mod entry;
mod log;

pub use entry::{AuditEntry, AuditStatus, AttemptRecord};
pub use log::AuditLog;
