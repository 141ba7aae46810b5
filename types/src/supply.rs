//! Token supply as reported by the token issuer.

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// Supply figures for the tracked token, replaced wholesale every cycle.
///
/// Amounts are kept as the decimal strings the ledger reports, in base units
/// (`10^precision` base units per whole token).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyInfo {
    pub issued_raw: String,
    pub supply_limit_raw: String,
    pub symbol: String,
    pub precision: u32,
}

impl SupplyInfo {
    /// Issued amount in base units.
    pub fn issued(&self) -> Result<i64, TypesError> {
        parse_amount(&self.issued_raw)
    }

    /// Supply limit in base units.
    pub fn supply_limit(&self) -> Result<i64, TypesError> {
        parse_amount(&self.supply_limit_raw)
    }

    /// Convert base units to whole tokens (truncating).
    pub fn to_tokens(&self, base_units: i64) -> i64 {
        match 10i64.checked_pow(self.precision) {
            Some(scale) => base_units / scale,
            None => 0,
        }
    }
}

/// Parse a ledger decimal string into base units.
pub fn parse_amount(raw: &str) -> Result<i64, TypesError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| TypesError::InvalidAmount(raw.to_string()))
}
