//! Ledger URL type with `acc://` scheme prefix.
//!
//! Identities, stake accounts, and token issuers are all ledger URLs. On-chain
//! data is not consistent about the scheme prefix or letter case, so every
//! comparison in the workspace goes through the helpers here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A well-formed ledger URL, always prefixed with `acc://`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerUrl(String);

impl LedgerUrl {
    /// The scheme prefix for all ledger URLs.
    pub const PREFIX: &'static str = "acc://";

    /// Parse and validate a ledger URL.
    ///
    /// The scheme must be present (any case) and the authority must be
    /// non-empty and free of whitespace.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let raw = raw.trim();
        if !has_scheme(raw) {
            return Err(TypesError::InvalidUrl(raw.to_string()));
        }
        let rest = &raw[Self::PREFIX.len()..];
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty() || rest.chars().any(char::is_whitespace) {
            return Err(TypesError::InvalidUrl(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Return the raw URL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The authority (identity) part, e.g. `staking.acme` for
    /// `acc://staking.acme/registered`.
    pub fn authority(&self) -> &str {
        let rest = &self.0[Self::PREFIX.len()..];
        rest.split('/').next().unwrap_or(rest)
    }
}

impl fmt::Display for LedgerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LedgerUrl {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn has_scheme(s: &str) -> bool {
    s.get(..LedgerUrl::PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(LedgerUrl::PREFIX))
}

/// Strip the `acc://` prefix (any case) if present.
pub fn strip_scheme(s: &str) -> &str {
    if has_scheme(s) {
        &s[LedgerUrl::PREFIX.len()..]
    } else {
        s
    }
}

/// Case-insensitive comparison of two ledger URLs. Folds Unicode case,
/// not just ASCII.
pub fn eq_url(a: &str, b: &str) -> bool {
    a == b || fold(a).eq(fold(b))
}

fn fold(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

/// Case-insensitive comparison that tolerates the scheme prefix being present
/// on one side only.
pub fn eq_url_loose(a: &str, b: &str) -> bool {
    eq_url(a, b) || eq_url(strip_scheme(a), strip_scheme(b))
}

/// Lowercased lookup key for an identity.
pub fn identity_key(identity: &str) -> String {
    fold(identity).collect()
}
