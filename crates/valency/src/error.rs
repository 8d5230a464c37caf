//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! degenerate inputs handed to the cache and growth entry points, array size mismatches
//! between compiled tables, and malformed pattern definitions. Structural match failures
//! and exhausted growth budgets are not errors and never surface here.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed pattern '{pattern}': {reason}")]
    MalformedPattern { pattern: String, reason: String },

    #[error("unknown socket type '{name}'")]
    UnknownSocketType { name: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn malformed(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
