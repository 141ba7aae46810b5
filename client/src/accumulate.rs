//! JSON-RPC v2 client for the Accumulate ledger API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::LedgerClientError;
use crate::types::{DataEntry, EntrySet, TokenIssuerInfo};
use crate::LedgerClient;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the ledger's JSON-RPC endpoint.
///
/// Sends `POST {endpoint}` with `{"jsonrpc":"2.0","method":...,"params":...}`.
pub struct AccumulateClient {
    endpoint: String,
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct UrlParams<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct DataSetParams<'a> {
    url: &'a str,
    start: u64,
    count: u64,
    expand: bool,
}

/// `query-data-set` result.
#[derive(Deserialize)]
struct DataSetResult {
    #[serde(default)]
    items: Vec<DataSetItem>,
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataSetItem {
    #[serde(default)]
    entry_hash: String,
    #[serde(default)]
    entry: Option<EntryBody>,
}

#[derive(Deserialize)]
struct EntryBody {
    #[serde(default)]
    data: Vec<String>,
}

/// `query` result for a single account.
#[derive(Deserialize)]
struct QueryResult<D> {
    #[serde(rename = "type")]
    record_type: String,
    data: D,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenIssuerData {
    #[serde(default)]
    url: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    precision: u32,
    #[serde(default)]
    issued: String,
    #[serde(default)]
    supply_limit: String,
}

#[derive(Deserialize)]
struct TokenAccountData {
    balance: String,
}

impl AccumulateClient {
    /// Create a client for `endpoint` (e.g. `https://mainnet.accumulatenetwork.io/v2`)
    /// with a per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http_client,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, LedgerClientError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LedgerClientError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    LedgerClientError::Unreachable(format!("connection failed: {e}"))
                } else {
                    LedgerClientError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(LedgerClientError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: RpcResponse<R> = response.json().await.map_err(|e| {
            LedgerClientError::InvalidResponse(format!("failed to parse {method} response: {e}"))
        })?;
        unwrap_response(method, body)
    }
}

fn unwrap_response<R>(method: &str, body: RpcResponse<R>) -> Result<R, LedgerClientError> {
    if let Some(err) = body.error {
        return Err(LedgerClientError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    body.result.ok_or_else(|| {
        LedgerClientError::InvalidResponse(format!("{method} response has no result"))
    })
}

fn into_entry_set(result: DataSetResult) -> EntrySet {
    let entries = result
        .items
        .into_iter()
        .map(|item| DataEntry {
            entry_hash: item.entry_hash,
            data: item.entry.map(|e| e.data).unwrap_or_default(),
        })
        .collect();
    EntrySet {
        entries,
        total: result.total,
    }
}

fn expect_type<D>(
    url: &str,
    result: QueryResult<D>,
    accepted: &[&'static str],
) -> Result<D, LedgerClientError> {
    if accepted
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&result.record_type))
    {
        Ok(result.data)
    } else {
        Err(LedgerClientError::UnexpectedType {
            url: url.to_string(),
            expected: accepted[0],
            found: result.record_type,
        })
    }
}

impl LedgerClient for AccumulateClient {
    async fn fetch_entry_set(
        &self,
        url: &str,
        start: u64,
        count: u64,
        expand: bool,
    ) -> Result<EntrySet, LedgerClientError> {
        let params = DataSetParams {
            url,
            start,
            count,
            expand,
        };
        let result: DataSetResult = self.call("query-data-set", params).await?;
        let set = into_entry_set(result);
        tracing::debug!(url, start, received = set.entries.len(), total = set.total, "fetched data set page");
        Ok(set)
    }

    async fn fetch_token_issuer(&self, url: &str) -> Result<TokenIssuerInfo, LedgerClientError> {
        let result: QueryResult<TokenIssuerData> = self.call("query", UrlParams { url }).await?;
        let data = expect_type(url, result, &["tokenIssuer"])?;
        Ok(TokenIssuerInfo {
            url: data.url,
            symbol: data.symbol,
            precision: data.precision,
            issued: data.issued,
            supply_limit: data.supply_limit,
        })
    }

    async fn fetch_account_balance(&self, url: &str) -> Result<String, LedgerClientError> {
        let result: QueryResult<TokenAccountData> = self.call("query", UrlParams { url }).await?;
        let data = expect_type(url, result, &["tokenAccount", "liteTokenAccount"])?;
        Ok(data.balance)
    }
}
