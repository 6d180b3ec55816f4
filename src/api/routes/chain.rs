//! Chain Routes
//!
//! - GET /api/v1/chain/balance/:address - Account balance (`?tokenType=&decimals=`)
//! - GET /api/v1/chain/transactions/:hash - Transaction by hash
//! - GET /api/v1/chain/gas-price - Current gas price estimate
//! - POST /api/v1/chain/payload - Unsigned creation payload for a wallet

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::generate::parse_parameters;
use super::sandbox::parse_kind;
use crate::api::dto::{
    ok, ApiResponse, BalanceQuery, BalanceResponse, GasPriceResponse, PayloadRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chain::format::{
    format_balance, is_valid_address, is_valid_transaction_hash, APT_DECIMALS, MAX_DECIMALS,
};
use crate::chain::{payload, ChainClient, EntryFunctionPayload};
use crate::sandbox::SimulationParameters;

fn client(state: &AppState) -> ApiResult<&ChainClient> {
    state
        .chain
        .as_deref()
        .ok_or_else(|| ApiError::ServiceUnavailable {
            message: "Chain client not configured".to_string(),
            details: "Set chain.network or APTOS_NODE_URL".to_string(),
        })
}

/// GET /api/v1/chain/balance/:address
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(query): Query<BalanceQuery>,
) -> ApiResult<Json<ApiResponse<BalanceResponse>>> {
    if !is_valid_address(&address) {
        return Err(ApiError::Validation(format!("Invalid address: {}", address)));
    }
    let decimals = query.decimals.unwrap_or(APT_DECIMALS);
    if decimals > MAX_DECIMALS {
        return Err(ApiError::Validation(format!(
            "Decimals must be between 0 and {}",
            MAX_DECIMALS
        )));
    }

    let chain = client(&state)?;
    let balance = chain
        .account_balance(&address, query.token_type.as_deref())
        .await;
    let formatted = format_balance(&balance, decimals)
        .unwrap_or_else(|| balance.clone());

    Ok(ok(BalanceResponse {
        address,
        token_type: query.token_type,
        balance,
        formatted,
    }))
}

/// GET /api/v1/chain/transactions/:hash
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    if !is_valid_transaction_hash(&hash) {
        return Err(ApiError::Validation(format!("Invalid transaction hash: {}", hash)));
    }
    let chain = client(&state)?;
    chain
        .transaction_status(&hash)
        .await
        .map(ok)
        .ok_or_else(|| ApiError::NotFound(format!("Transaction not found: {}", hash)))
}

/// GET /api/v1/chain/gas-price
pub async fn get_gas_price(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<GasPriceResponse>>> {
    let chain = client(&state)?;
    let estimate = chain
        .estimate_gas_price()
        .await
        .map_err(|e| ApiError::chain("Failed to estimate gas price", e))?;

    Ok(ok(GasPriceResponse {
        network: chain.network().to_string(),
        estimate,
    }))
}

/// POST /api/v1/chain/payload
///
/// Needs no fullnode: the payload is built locally.
pub async fn build_payload(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PayloadRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<EntryFunctionPayload>>> {
    let Json(req) = body?;
    let kind = parse_kind(&req.kind)?;
    let params = parse_parameters(kind, &req.parameters)?;

    let built = match &params {
        SimulationParameters::Token(p) => payload::create_token(&state.contracts, p),
        SimulationParameters::Pool(p) => payload::create_pool(&state.contracts, p),
        SimulationParameters::Vault(p) => payload::create_vault(&state.contracts, p),
    }
    .map_err(|e| ApiError::chain("Failed to build payload", e))?;

    tracing::info!(function = %built.function, "Built entry-function payload");
    Ok(ok(built))
}
