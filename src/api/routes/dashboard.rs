//! Dashboard Route
//!
//! - GET /api/v1/dashboard - Counts and recent activity from the store

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{ok, ApiResponse, DashboardResponse};
use crate::api::state::AppState;
use crate::sandbox::SimulationStatus;

const RECENT: usize = 5;

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<DashboardResponse>> {
    let snapshot = state.store.snapshot().await;

    let mut recent_tokens = snapshot.tokens.clone();
    recent_tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_tokens.truncate(RECENT);

    let mut recent_simulations = snapshot.simulations.clone();
    recent_simulations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_simulations.truncate(RECENT);

    ok(DashboardResponse {
        wallet_connected: snapshot.wallet.connected,
        wallet_address: snapshot.wallet.address.clone(),
        token_count: snapshot.tokens.len(),
        pool_count: snapshot.pools.len(),
        vault_count: snapshot.vaults.len(),
        active_pools: snapshot.pools.iter().filter(|p| p.is_active).count(),
        simulation_count: snapshot.simulations.len(),
        successful_simulations: snapshot
            .simulations
            .iter()
            .filter(|s| s.status == SimulationStatus::Success)
            .count(),
        message_count: snapshot
            .current_session
            .as_ref()
            .map(|s| s.messages.len())
            .unwrap_or(0),
        recent_tokens,
        recent_simulations,
    })
}
