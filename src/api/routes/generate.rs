//! Code Generation Routes
//!
//! - POST /api/v1/token/generate - Move code for a fungible token
//! - POST /api/v1/pool/generate - Move code for a liquidity pool
//! - POST /api/v1/vault/generate - Move code for a yield vault

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ok, ApiResponse, GenerateRequest, GenerateResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::sandbox::{check_required_fields, required_fields, SimulationKind, SimulationParameters};

type GenerateResult = ApiResult<Json<ApiResponse<GenerateResponse>>>;

/// POST /api/v1/token/generate
pub async fn generate_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> GenerateResult {
    generate(&state, SimulationKind::Token, payload).await
}

/// POST /api/v1/pool/generate
pub async fn generate_pool(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> GenerateResult {
    generate(&state, SimulationKind::Pool, payload).await
}

/// POST /api/v1/vault/generate
pub async fn generate_vault(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> GenerateResult {
    generate(&state, SimulationKind::Vault, payload).await
}

async fn generate(
    state: &AppState,
    kind: SimulationKind,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> GenerateResult {
    let Json(req) = payload?;

    let raw = req
        .parameters
        .filter(|p| !p.is_null())
        .ok_or_else(|| ApiError::Validation(format!("{} parameters are required", title(kind))))?;

    let params = parse_parameters(kind, &raw)?;

    let code = state
        .assistant
        .generate_code(&params)
        .await
        .map_err(|e| ApiError::llm(format!("Failed to generate {} code", kind), e))?;

    tracing::info!(kind = %kind, name = %params.name(), bytes = code.len(), "Generated code");

    Ok(ok(GenerateResponse {
        code,
        parameters: raw,
    }))
}

/// Required-key check, then typed decoding
pub(crate) fn parse_parameters(
    kind: SimulationKind,
    raw: &serde_json::Value,
) -> ApiResult<SimulationParameters> {
    check_required_fields(raw, required_fields(kind)).map_err(ApiError::Validation)?;

    SimulationParameters::from_value(kind, raw.clone())
        .map_err(|e| ApiError::Validation(format!("Invalid {} parameters: {}", kind, e)))
}

fn title(kind: SimulationKind) -> &'static str {
    match kind {
        SimulationKind::Token => "Token",
        SimulationKind::Pool => "Pool",
        SimulationKind::Vault => "Vault",
    }
}
