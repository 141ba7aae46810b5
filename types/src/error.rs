//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for domain-level validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid ledger url: {0}")]
    InvalidUrl(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
