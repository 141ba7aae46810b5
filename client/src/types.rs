//! Ledger response types exposed to callers.

use serde::{Deserialize, Serialize};

/// One data entry of a data account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntry {
    /// Hash of the entry, used as record provenance.
    pub entry_hash: String,
    /// Hex-encoded data segments. The first segment holds the payload.
    pub data: Vec<String>,
}

/// One page of a data account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySet {
    pub entries: Vec<DataEntry>,
    /// Entries available in the data account overall.
    pub total: u64,
}

/// Token issuer state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenIssuerInfo {
    pub url: String,
    pub symbol: String,
    pub precision: u32,
    /// Issued amount in base units (decimal string).
    pub issued: String,
    /// Supply limit in base units (decimal string).
    pub supply_limit: String,
}
