//! Sandbox Routes
//!
//! - POST /api/v1/sandbox/test - Test a piece of code in one shot
//! - POST /api/v1/sandbox/validate - Check parameters without generating
//! - GET /api/v1/sandbox/simulations - List simulations
//! - POST /api/v1/sandbox/simulations - Create a simulation
//! - GET /api/v1/sandbox/simulations/:id - Get a simulation
//! - DELETE /api/v1/sandbox/simulations/:id - Delete a simulation
//! - POST /api/v1/sandbox/simulations/:id/generate - Generate its code
//! - POST /api/v1/sandbox/simulations/:id/test - Test its code

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::generate::parse_parameters;
use crate::api::dto::{
    ok, ApiResponse, CreateSimulationRequest, GeneratedCodeResponse, SandboxTestRequest,
    ValidateRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::sandbox::{validate_parameters, SandboxSimulation, SimulationKind, ValidationReport};

type SimulationResponse = Json<ApiResponse<SandboxSimulation>>;

/// POST /api/v1/sandbox/test
///
/// Creates a simulation around the submitted code and tests it.
pub async fn test_code(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SandboxTestRequest>, JsonRejection>,
) -> ApiResult<SimulationResponse> {
    let Json(req) = payload?;

    let (code, kind) = match (req.code, req.kind) {
        (Some(code), Some(kind)) if !code.is_empty() && !kind.is_empty() => (code, kind),
        _ => return Err(ApiError::Validation("Code and type are required".to_string())),
    };
    let kind = parse_kind(&kind)?;

    let simulation = state.sandbox.test_source(kind, code).await?;
    Ok(ok(simulation))
}

/// POST /api/v1/sandbox/validate
pub async fn validate(
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<ValidationReport>>> {
    let Json(req) = payload?;
    let kind = parse_kind(&req.kind)?;
    Ok(ok(validate_parameters(kind, &req.parameters)))
}

/// GET /api/v1/sandbox/simulations
pub async fn list_simulations(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<SandboxSimulation>>> {
    ok(state.sandbox.list().await)
}

/// POST /api/v1/sandbox/simulations
pub async fn create_simulation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSimulationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, SimulationResponse)> {
    let Json(req) = payload?;
    let kind = parse_kind(&req.kind)?;

    let parameters = match req.parameters.filter(|p| !p.is_null()) {
        Some(raw) => Some(parse_parameters(kind, &raw)?),
        None => None,
    };

    let simulation = state.sandbox.create_simulation(kind, parameters).await?;
    tracing::info!(simulation = %simulation.id, kind = %kind, "Created simulation");

    Ok((StatusCode::CREATED, ok(simulation)))
}

/// GET /api/v1/sandbox/simulations/:id
pub async fn get_simulation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SimulationResponse> {
    state
        .sandbox
        .get(&id)
        .await
        .map(ok)
        .ok_or_else(|| ApiError::NotFound(format!("Simulation not found: {}", id)))
}

/// DELETE /api/v1/sandbox/simulations/:id
pub async fn delete_simulation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.sandbox.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Simulation not found: {}", id)))
    }
}

/// POST /api/v1/sandbox/simulations/:id/generate
pub async fn generate_simulation_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<GeneratedCodeResponse>>> {
    let code = state.sandbox.generate_code(&id).await?;
    let simulation = state
        .sandbox
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Simulation not found: {}", id)))?;

    Ok(ok(GeneratedCodeResponse { code, simulation }))
}

/// POST /api/v1/sandbox/simulations/:id/test
pub async fn test_simulation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SimulationResponse> {
    Ok(ok(state.sandbox.test_code(&id).await?))
}

pub(crate) fn parse_kind(kind: &str) -> ApiResult<SimulationKind> {
    kind.parse().map_err(ApiError::Validation)
}
