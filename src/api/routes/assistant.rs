//! Assistant Routes
//!
//! - POST /api/v1/assistant/explain - Explain a DeFi concept
//! - POST /api/v1/assistant/recommend - DeFi recommendations for a situation
//! - POST /api/v1/assistant/dialog - One turn of the guided creation dialog

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ok, ApiResponse, DialogRequest, ExplainRequest, RecommendRequest, TextResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::assistant::{DialogState, DialogTurn};

const DEFAULT_DIALOG: &str = "default";

/// POST /api/v1/assistant/explain
pub async fn explain(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<TextResponse>>> {
    let Json(req) = payload?;
    if req.concept.trim().is_empty() {
        return Err(ApiError::Validation("Concept is required".to_string()));
    }

    let response = state
        .assistant
        .explain_concept(&req.concept)
        .await
        .map_err(|e| ApiError::llm("Failed to explain concept", e))?;

    Ok(ok(TextResponse { response }))
}

/// POST /api/v1/assistant/recommend
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<TextResponse>>> {
    let Json(req) = payload?;
    if req.context.trim().is_empty() {
        return Err(ApiError::Validation("Context is required".to_string()));
    }

    let response = state
        .assistant
        .recommend(&req.context)
        .await
        .map_err(|e| ApiError::llm("Failed to get recommendations", e))?;

    Ok(ok(TextResponse { response }))
}

/// POST /api/v1/assistant/dialog
///
/// Dialog state is kept per `sessionId` (a shared default when omitted)
/// and dropped once the dialog is back at idle.
pub async fn dialog_turn(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DialogRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<DialogTurn>>> {
    let Json(req) = payload?;
    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("Message is required".to_string()));
    }

    let session = req
        .session_id
        .unwrap_or_else(|| DEFAULT_DIALOG.to_string());

    let turn = {
        let mut dialogs = state.dialogs.write().await;
        let turn = dialogs.entry(session.clone()).or_default().handle(&req.message);
        if turn.state == DialogState::Idle {
            dialogs.remove(&session);
        }
        turn
    };

    tracing::debug!(session = %session, outcome = ?turn.outcome, "Dialog turn");
    Ok(ok(turn))
}
