//! Ledger entry payload decoding.
//!
//! Staking feed: try the single-account encoding first, then the
//! multi-account encoding. Token feed: token encoding only. Every decode
//! also enforces required fields; a payload that passes neither is rejected.

use serde::Deserialize;

use acme_client::DataEntry;
use acme_types::{LedgerUrl, MultiAccountRecord, RecordType, StakingRecord, SubAccount, Token};

use crate::error::DecodeError;

/// A staking entry in either encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedStaking {
    Single(StakingRecord),
    Multi {
        record: MultiAccountRecord,
        entry_hash: String,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleAccountWire {
    #[serde(default, rename = "type")]
    record_type: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    identity: String,
    #[serde(default)]
    stake: String,
    #[serde(default)]
    rewards: String,
    #[serde(default)]
    delegate: String,
    #[serde(default)]
    accepting_delegates: String,
}

#[derive(Deserialize)]
struct MultiAccountWire {
    #[serde(default)]
    identity: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    accounts: Vec<SingleAccountWire>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenWire {
    #[serde(default)]
    token_issuer: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    logo: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

fn required(value: &str, field: &'static str) -> Result<(), DecodeError> {
    if value.trim().is_empty() {
        Err(DecodeError::MissingField(field))
    } else {
        Ok(())
    }
}

/// The JSON payload of an entry: its first data segment, hex-decoded.
pub fn entry_payload(entry: &DataEntry) -> Result<Vec<u8>, DecodeError> {
    let first = entry.data.first().ok_or(DecodeError::EmptyEntry)?;
    if first.is_empty() {
        return Err(DecodeError::EmptyEntry);
    }
    Ok(hex::decode(first)?)
}

fn decode_single(payload: &[u8], entry_hash: &str) -> Result<StakingRecord, DecodeError> {
    let wire: SingleAccountWire = serde_json::from_slice(payload)?;
    required(&wire.record_type, "type")?;
    required(&wire.identity, "identity")?;
    required(&wire.stake, "stake")?;
    required(&wire.rewards, "rewards")?;
    Ok(StakingRecord {
        record_type: RecordType::parse(&wire.record_type),
        status: wire.status,
        identity: wire.identity.trim().to_string(),
        stake_account: wire.stake.trim().to_string(),
        rewards_account: wire.rewards.trim().to_string(),
        delegate: wire.delegate.trim().to_string(),
        accepting_delegates: wire.accepting_delegates,
        source_entry_hash: entry_hash.to_string(),
        balance: 0,
    })
}

fn decode_multi(payload: &[u8]) -> Result<MultiAccountRecord, DecodeError> {
    let wire: MultiAccountWire = serde_json::from_slice(payload)?;
    required(&wire.identity, "identity")?;
    if wire.accounts.is_empty() {
        return Err(DecodeError::MissingField("accounts"));
    }

    let mut accounts = Vec::with_capacity(wire.accounts.len());
    for (index, sub) in wire.accounts.into_iter().enumerate() {
        for (value, field) in [
            (&sub.record_type, "type"),
            (&sub.stake, "stake"),
            (&sub.rewards, "rewards"),
        ] {
            if value.trim().is_empty() {
                return Err(DecodeError::SubAccountField { index, field });
            }
        }
        accounts.push(SubAccount {
            record_type: RecordType::parse(&sub.record_type),
            stake_account: sub.stake.trim().to_string(),
            rewards_account: sub.rewards.trim().to_string(),
            delegate: sub.delegate.trim().to_string(),
            accepting_delegates: sub.accepting_delegates,
        });
    }

    Ok(MultiAccountRecord {
        identity: wire.identity.trim().to_string(),
        status: wire.status,
        accounts,
    })
}

/// Decode a staking feed payload.
pub fn decode_staking(payload: &[u8], entry_hash: &str) -> Result<DecodedStaking, DecodeError> {
    let single = match decode_single(payload, entry_hash) {
        Ok(record) => return Ok(DecodedStaking::Single(record)),
        Err(e) => e,
    };
    match decode_multi(payload) {
        Ok(record) => Ok(DecodedStaking::Multi {
            record,
            entry_hash: entry_hash.to_string(),
        }),
        Err(multi) => Err(DecodeError::Unrecognized {
            single: Box::new(single),
            multi: Box::new(multi),
        }),
    }
}

/// Decode a token feed payload. The issuer must be a well-formed ledger URL.
pub fn decode_token(payload: &[u8]) -> Result<Token, DecodeError> {
    let wire: TokenWire = serde_json::from_slice(payload)?;
    required(&wire.token_issuer, "tokenIssuer")?;
    let issuer = LedgerUrl::parse(&wire.token_issuer)?;
    Ok(Token {
        token_issuer: issuer.as_str().to_string(),
        symbol: wire.symbol.trim().to_string(),
        logo: wire.logo,
        name: wire.name,
        url: wire.url,
    })
}
