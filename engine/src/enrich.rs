//! Attach ledger balances to records, token symbols, and supply info.
//!
//! A failed lookup never aborts the cycle: a record keeps its previous
//! balance, a foundation account contributes zero.

use std::collections::HashMap;

use acme_client::LedgerClient;
use acme_types::supply::parse_amount;
use acme_types::url::identity_key;
use acme_types::{StakingRecord, SupplyInfo, Token};

use crate::error::RefreshError;

/// Outcome counts of a balance enrichment pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub refreshed: usize,
    pub failed: usize,
}

async fn fetch_balance<C: LedgerClient>(client: &C, account: &str) -> Result<i64, RefreshError> {
    let raw = client.fetch_account_balance(account).await?;
    Ok(parse_amount(&raw)?)
}

/// Refresh `balance` of every record from its stake account.
///
/// Each stake account is queried once per pass, even when several records
/// share it.
pub async fn enrich_balances<C: LedgerClient>(
    client: &C,
    records: &mut [StakingRecord],
) -> EnrichStats {
    let mut stats = EnrichStats::default();
    let mut seen: HashMap<String, Option<i64>> = HashMap::new();

    for record in records.iter_mut() {
        let key = identity_key(&record.stake_account);
        let cached = seen.get(&key).copied();
        let balance = match cached {
            Some(cached) => cached,
            None => {
                let fetched = match fetch_balance(client, &record.stake_account).await {
                    Ok(balance) => Some(balance),
                    Err(e) => {
                        tracing::warn!(
                            identity = %record.identity,
                            account = %record.stake_account,
                            error = %e,
                            "balance lookup failed, keeping previous balance"
                        );
                        None
                    }
                };
                seen.insert(key, fetched);
                fetched
            }
        };

        match balance {
            Some(balance) => {
                record.balance = balance;
                stats.refreshed += 1;
            }
            None => stats.failed += 1,
        }
    }
    stats
}

/// Sum of the balances of the foundation accounts. Failed lookups count
/// as zero.
pub async fn foundation_total<C: LedgerClient>(client: &C, accounts: &[String]) -> i64 {
    let mut total = 0i64;
    for account in accounts {
        match fetch_balance(client, account).await {
            Ok(balance) => total = total.saturating_add(balance),
            Err(e) => {
                tracing::warn!(%account, error = %e, "foundation balance lookup failed");
            }
        }
    }
    total
}

/// Replace each token's symbol with the one its issuer reports. Returns the
/// number of failed lookups; those tokens keep their current symbol.
pub async fn refresh_token_symbols<C: LedgerClient>(client: &C, tokens: &mut [Token]) -> usize {
    let mut failed = 0;
    for token in tokens.iter_mut() {
        match client.fetch_token_issuer(&token.token_issuer).await {
            Ok(issuer) if !issuer.symbol.is_empty() => token.symbol = issuer.symbol,
            Ok(_) => {}
            Err(e) => {
                failed += 1;
                tracing::warn!(issuer = %token.token_issuer, error = %e, "token issuer lookup failed");
            }
        }
    }
    failed
}

/// Query the supply of the token issued by `issuer`.
pub async fn fetch_supply<C: LedgerClient>(
    client: &C,
    issuer: &str,
) -> Result<SupplyInfo, RefreshError> {
    let info = client.fetch_token_issuer(issuer).await?;
    let supply = SupplyInfo {
        issued_raw: info.issued,
        supply_limit_raw: info.supply_limit,
        symbol: info.symbol,
        precision: info.precision,
    };
    supply.issued()?;
    supply.supply_limit()?;
    Ok(supply)
}
