use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerClientError {
    #[error("ledger unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP request to ledger failed: {0}")]
    RequestFailed(String),

    #[error("ledger returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response from ledger: {0}")]
    InvalidResponse(String),

    #[error("unexpected record type {found} for {url}, expected {expected}")]
    UnexpectedType {
        url: String,
        expected: &'static str,
        found: String,
    },
}
