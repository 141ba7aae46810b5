//! Registered token metadata.

use serde::{Deserialize, Serialize};

/// A token listed in the token data account, keyed by its issuer URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token_issuer: String,
    pub symbol: String,
    pub logo: String,
    pub name: String,
    pub url: String,
}

impl Token {
    /// Replace metadata with `update`, keeping the stored issuer spelling.
    /// An empty symbol in the update does not erase a known one.
    pub fn overwrite_with(&mut self, update: Token) {
        let token_issuer = std::mem::take(&mut self.token_issuer);
        let symbol = if update.symbol.is_empty() {
            std::mem::take(&mut self.symbol)
        } else {
            update.symbol.clone()
        };
        *self = Token {
            token_issuer,
            symbol,
            ..update
        };
    }
}
