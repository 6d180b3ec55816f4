//! Store Routes
//!
//! Read and edit the persisted client state.
//!
//! - GET /api/v1/state - Full store snapshot
//! - DELETE /api/v1/state - Reset everything
//! - GET|POST /api/v1/tokens, DELETE /api/v1/tokens/:id
//! - GET|POST /api/v1/pools, DELETE /api/v1/pools/:id
//! - GET|POST /api/v1/vaults, DELETE /api/v1/vaults/:id
//! - GET|PUT /api/v1/wallet

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::dto::{ok, ApiResponse, CreatePoolRequest, CreateTokenRequest, CreateVaultRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chain::format::is_valid_token_symbol;
use crate::store::{Pool, StoreState, Token, User, Vault, WalletState};

/// Snapshot plus runtime-only status
#[derive(Debug, Serialize)]
pub struct StateView {
    #[serde(flatten)]
    pub state: StoreState,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/v1/state
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StateView>> {
    let snapshot = state.store.snapshot().await;
    ok(StateView {
        loading: snapshot.loading,
        error: snapshot.error.clone(),
        state: snapshot,
    })
}

/// DELETE /api/v1/state
pub async fn clear_state(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.sandbox.clear().await?;
    state.store.clear().await?;
    state.dialogs.write().await.clear();
    tracing::info!("Store cleared");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================
// Tokens
// ============================================

/// GET /api/v1/tokens
pub async fn list_tokens(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<Token>>> {
    ok(state.store.tokens().await)
}

/// POST /api/v1/tokens
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTokenRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Token>>)> {
    let Json(req) = payload?;

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Token name is required".to_string()));
    }
    if !is_valid_token_symbol(&req.symbol) {
        return Err(ApiError::Validation(
            "Token symbol must be 1-10 upper-case letters or digits".to_string(),
        ));
    }

    let creator = creator_or_wallet(&state, req.creator).await;
    let mut token = Token::new(
        req.name,
        req.symbol,
        req.decimals,
        req.total_supply,
        req.contract_address
            .unwrap_or_else(|| state.contracts.token.clone()),
        creator,
    );
    if let Some(uri) = req.icon_uri {
        token = token.icon_uri(uri);
    }
    if let Some(uri) = req.project_uri {
        token = token.project_uri(uri);
    }

    state.store.add_token(token.clone()).await?;
    tracing::info!(token = %token.id, symbol = %token.symbol, "Token recorded");

    Ok((StatusCode::CREATED, ok(token)))
}

/// DELETE /api/v1/tokens/:id
pub async fn delete_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Token>>> {
    Ok(ok(state.store.remove_token(&id).await?))
}

// ============================================
// Pools
// ============================================

/// GET /api/v1/pools
pub async fn list_pools(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<Pool>>> {
    ok(state.store.pools().await)
}

/// POST /api/v1/pools
///
/// `tokenA` and `tokenB` are ids of stored tokens.
pub async fn create_pool(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePoolRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Pool>>)> {
    let Json(req) = payload?;

    if req.token_a == req.token_b {
        return Err(ApiError::Validation(
            "Token A and Token B must be different".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&req.fee) {
        return Err(ApiError::Validation("Fee must be between 0 and 100".to_string()));
    }

    let token_a = find_token(&state, &req.token_a).await?;
    let token_b = find_token(&state, &req.token_b).await?;
    let creator = creator_or_wallet(&state, req.creator).await;

    let mut pool = Pool::new(
        req.name,
        token_a,
        token_b,
        req.fee,
        req.contract_address
            .unwrap_or_else(|| state.contracts.pool.clone()),
        creator,
    );
    if let Some(liquidity) = req.liquidity {
        pool = pool.liquidity(liquidity);
    }

    state.store.add_pool(pool.clone()).await?;
    tracing::info!(pool = %pool.id, "Pool recorded");

    Ok((StatusCode::CREATED, ok(pool)))
}

/// DELETE /api/v1/pools/:id
pub async fn delete_pool(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Pool>>> {
    Ok(ok(state.store.remove_pool(&id).await?))
}

// ============================================
// Vaults
// ============================================

/// GET /api/v1/vaults
pub async fn list_vaults(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<Vault>>> {
    ok(state.store.vaults().await)
}

/// POST /api/v1/vaults
pub async fn create_vault(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateVaultRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Vault>>)> {
    let Json(req) = payload?;

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Vault name is required".to_string()));
    }

    let token = find_token(&state, &req.token).await?;
    let creator = creator_or_wallet(&state, req.creator).await;

    let mut vault = Vault::new(
        req.name,
        token,
        req.apy,
        req.contract_address
            .unwrap_or_else(|| state.contracts.vault.clone()),
        creator,
    );
    if let Some(total) = req.total_value {
        vault.total_value = total;
    }

    state.store.add_vault(vault.clone()).await?;
    tracing::info!(vault = %vault.id, "Vault recorded");

    Ok((StatusCode::CREATED, ok(vault)))
}

/// DELETE /api/v1/vaults/:id
pub async fn delete_vault(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vault>>> {
    Ok(ok(state.store.remove_vault(&id).await?))
}

// ============================================
// Wallet
// ============================================

/// GET /api/v1/wallet
pub async fn get_wallet(State(state): State<Arc<AppState>>) -> Json<ApiResponse<WalletState>> {
    ok(state.store.wallet().await)
}

/// PUT /api/v1/wallet
///
/// Connecting an address makes it the current user; disconnecting clears
/// the user.
pub async fn set_wallet(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WalletState>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<WalletState>>> {
    let Json(wallet) = payload?;

    if wallet.connected && wallet.address.is_none() {
        return Err(ApiError::Validation(
            "A connected wallet needs an address".to_string(),
        ));
    }

    match (&wallet.address, wallet.connected) {
        (Some(address), true) => {
            let current = state.store.user().await;
            if current.map(|u| &u.address != address).unwrap_or(true) {
                state.store.set_user(Some(User::new(address.clone()))).await?;
            }
        }
        _ => state.store.set_user(None).await?,
    }

    state.store.set_wallet(wallet.clone()).await?;
    Ok(ok(wallet))
}

async fn find_token(state: &AppState, id: &str) -> ApiResult<Token> {
    state
        .store
        .tokens()
        .await
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("Token not found: {}", id)))
}

/// Explicit creator, else the connected wallet, else `anonymous`
async fn creator_or_wallet(state: &AppState, creator: Option<String>) -> String {
    match creator {
        Some(c) => c,
        None => state
            .store
            .wallet()
            .await
            .address
            .unwrap_or_else(|| "anonymous".to_string()),
    }
}
