//! HTTP request handlers.
//!
//! Each handler loads the published snapshot once and answers from that
//! value alone.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};

use acme_engine::CategoryCounts;
use acme_types::{StakingRecord, Token, Validator};

use crate::error::ApiError;
use crate::pagination::{Page, PageParams, SortOrder};
use crate::query::{self, SortKey, SupplyFilter, SupplyView};
use crate::server::RpcState;

// ── Request parameters ───────────────────────────────────────────────────

/// List parameters, kept as raw strings so malformed numbers get a JSON
/// error body instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub start: Option<String>,
    pub count: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListQuery {
    fn page(&self) -> Result<PageParams, ApiError> {
        PageParams::parse(self.start.as_deref(), self.count.as_deref())
    }

    fn sort(&self) -> (Option<SortKey>, SortOrder) {
        (
            SortKey::parse(self.sort.as_deref()),
            SortOrder::parse(self.order.as_deref()),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StakerSearch {
    pub stake: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidatorSearch {
    pub identity: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenSearch {
    pub symbol: Option<String>,
}

fn required(value: Option<&str>, name: &'static str) -> Result<String, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::MissingParameter(name))
}

// ── Supply ───────────────────────────────────────────────────────────────

pub async fn get_supply(State(state): State<RpcState>) -> Result<Json<SupplyView>, ApiError> {
    let snapshot = state.reader.load();
    query::supply(&snapshot).map(Json)
}

/// A single whole-token figure as a bare JSON number.
pub async fn get_supply_filtered(
    State(state): State<RpcState>,
    Path(filter): Path<String>,
) -> Result<Json<i64>, ApiError> {
    let filter = SupplyFilter::parse(&filter)?;
    let snapshot = state.reader.load();
    Ok(Json(query::supply(&snapshot)?.scalar(filter)))
}

// ── Staking ──────────────────────────────────────────────────────────────

pub async fn get_staking_summary(State(state): State<RpcState>) -> Json<CategoryCounts> {
    Json(query::staking_summary(&state.reader.load()))
}

pub async fn get_stakers(
    State(state): State<RpcState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Page<StakingRecord>>, ApiError> {
    let page = params.page()?;
    let (key, order) = params.sort();
    Ok(Json(query::stakers(&state.reader.load(), page, key, order)))
}

pub async fn search_staker(
    State(state): State<RpcState>,
    Query(params): Query<StakerSearch>,
) -> Result<Json<Option<StakingRecord>>, ApiError> {
    let stake = required(params.stake.as_deref(), "stake")?;
    Ok(Json(query::search_staker(&state.reader.load(), &stake)))
}

// ── Validators ───────────────────────────────────────────────────────────

pub async fn get_validators(
    State(state): State<RpcState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Page<Validator>>, ApiError> {
    let page = params.page()?;
    let (key, order) = params.sort();
    Ok(Json(query::validators(&state.reader.load(), page, key, order)))
}

pub async fn search_validator(
    State(state): State<RpcState>,
    Query(params): Query<ValidatorSearch>,
) -> Result<Json<Option<Validator>>, ApiError> {
    let identity = required(params.identity.as_deref(), "identity")?;
    Ok(Json(query::search_validator(&state.reader.load(), &identity)))
}

// ── Tokens ───────────────────────────────────────────────────────────────

pub async fn get_tokens(
    State(state): State<RpcState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Page<Token>>, ApiError> {
    let page = params.page()?;
    Ok(Json(query::tokens(&state.reader.load(), page)))
}

pub async fn search_token(
    State(state): State<RpcState>,
    Query(params): Query<TokenSearch>,
) -> Result<Json<Option<Token>>, ApiError> {
    let symbol = required(params.symbol.as_deref(), "symbol")?;
    Ok(Json(query::search_token(&state.reader.load(), &symbol)))
}

// ── Health & metrics ─────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub updated_at: u64,
    pub staking_records: usize,
    pub tokens: usize,
    pub supply_available: bool,
}

pub async fn health(State(state): State<RpcState>) -> Json<HealthResponse> {
    let snapshot = state.reader.load();
    Json(HealthResponse {
        status: "ok",
        updated_at: snapshot.updated_at().as_secs(),
        staking_records: snapshot.staking_records().len(),
        tokens: snapshot.tokens().len(),
        supply_available: snapshot.supply().is_some(),
    })
}

pub async fn metrics(State(state): State<RpcState>) -> Result<impl IntoResponse, ApiError> {
    let registry = state.registry.as_ref().ok_or(ApiError::MetricsDisabled)?;
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buf)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], buf))
}
