//! Health Routes
//!
//! Health check endpoints for monitoring and orchestrators.
//!
//! - GET /health/live - Liveness check (process is alive)
//! - GET /health/ready - Readiness check (store is writable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 when the store directory exists. The completion API and
/// fullnode are optional and do not gate readiness.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if check_store_health(&state) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_ok = check_store_health(&state);
    let llm_ok = state.llm_configured();

    let chain_status = match &state.chain {
        None => "disabled",
        Some(chain) => match chain.health_check().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::debug!(error = %e, "Fullnode health check failed");
                "unreachable"
            }
        },
    };

    let overall_status = if !store_ok {
        "unhealthy"
    } else if llm_ok && chain_status != "unreachable" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: overall_status.to_string(),
        store: if store_ok { "ok" } else { "error" }.to_string(),
        llm: if llm_ok { "configured" } else { "missing_api_key" }.to_string(),
        chain: chain_status.to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn check_store_health(state: &AppState) -> bool {
    state
        .store
        .path()
        .parent()
        .map(|dir| dir.as_os_str().is_empty() || dir.is_dir())
        .unwrap_or(true)
}
