//! Chat Routes
//!
//! - POST /api/v1/chat - Send a message to the assistant
//! - GET /api/v1/chat/session - Current chat session
//! - DELETE /api/v1/chat/session - Clear the chat session

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ok, ApiResponse, ChatRequest, ChatResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::assistant::recognize_intent;
use crate::llm::{CompletionMessage, MessageRole};
use crate::store::{ChatMessage, ChatRole, ChatSession, MessageMetadata};

const APOLOGY: &str = "I'm sorry, I encountered an error. Please try again.";

/// POST /api/v1/chat
///
/// Records the user message, asks the model for a reply and records that
/// too. The reply is tagged with the action the message appears to ask for.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<ChatResponse>>> {
    let Json(req) = payload?;

    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Message is required".to_string()))?;

    let history: Vec<CompletionMessage> = match req.conversation_history {
        Some(entries) => entries
            .into_iter()
            .map(|e| CompletionMessage {
                role: completion_role(e.role),
                content: e.content,
            })
            .collect(),
        None => state
            .store
            .current_session()
            .await
            .map(|session| session_history(&session))
            .unwrap_or_default(),
    };

    let intent = recognize_intent(&message);
    if let Some(intent) = &intent {
        tracing::debug!(intent = %intent.kind, entities = intent.entities.len(), "Intent recognized");
    }

    state.store.add_message(ChatMessage::user(&message)).await?;
    state.store.set_loading(true).await;

    let reply = state.assistant.chat(&message, &history).await;
    state.store.set_loading(false).await;

    match reply {
        Ok(response) => {
            let metadata = intent.as_ref().map(|i| MessageMetadata {
                action: i.action(),
                parameters: i
                    .entities
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect(),
                ..Default::default()
            });

            let mut assistant_message = ChatMessage::assistant(&response);
            if let Some(metadata) = metadata {
                assistant_message = assistant_message.with_metadata(metadata);
            }

            let session_id = state.store.add_message(assistant_message.clone()).await?;
            state.store.set_error(None).await;

            tracing::info!(session = %session_id, chars = response.len(), "Chat reply recorded");

            Ok(ok(ChatResponse {
                response,
                message: assistant_message,
                session_id,
                intent,
            }))
        }
        Err(e) => {
            if let Err(store_err) = state.store.add_message(ChatMessage::assistant(APOLOGY)).await {
                tracing::warn!(error = %store_err, "Failed to record apology message");
            }
            state
                .store
                .set_error(Some("Failed to send message".to_string()))
                .await;
            Err(ApiError::llm("Failed to process chat message", e))
        }
    }
}

/// GET /api/v1/chat/session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Option<ChatSession>>> {
    ok(state.store.current_session().await)
}

/// DELETE /api/v1/chat/session
pub async fn clear_session(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.store.clear_session().await?;
    state.dialogs.write().await.clear();
    Ok(StatusCode::NO_CONTENT)
}

fn completion_role(role: ChatRole) -> MessageRole {
    match role {
        ChatRole::User => MessageRole::User,
        ChatRole::Assistant => MessageRole::Assistant,
        ChatRole::System => MessageRole::System,
    }
}

fn session_history(session: &ChatSession) -> Vec<CompletionMessage> {
    session
        .messages
        .iter()
        .map(|m| CompletionMessage {
            role: completion_role(m.role),
            content: m.content.clone(),
        })
        .collect()
}
