//! Shared core types for Vigil feature crates

mod error;

pub use error::HttpError;
