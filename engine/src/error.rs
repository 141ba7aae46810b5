use acme_client::LedgerClientError;
use acme_types::TypesError;
use thiserror::Error;

/// Why a ledger entry was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("entry has no data")]
    EmptyEntry,

    #[error("entry data is not hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("sub-account {index} missing required field: {field}")]
    SubAccountField { index: usize, field: &'static str },

    #[error("invalid token issuer: {0}")]
    InvalidIssuer(#[from] TypesError),

    #[error("payload matches neither staking encoding (single-account: {single}; multi-account: {multi})")]
    Unrecognized {
        single: Box<DecodeError>,
        multi: Box<DecodeError>,
    },
}

/// Failure of a whole section of a refresh cycle.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerClientError),

    #[error("invalid ledger data: {0}")]
    Data(#[from] TypesError),
}
