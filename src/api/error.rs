//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to the `{success: false, error, details?, requestId}` envelope.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::chain::ChainError;
use crate::llm::LlmError;
use crate::sandbox::SandboxError;
use crate::store::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with the current state of a resource
    #[error("{0}")]
    Conflict(String),

    /// Completion API or fullnode call failed
    #[error("{message}")]
    Upstream { message: String, details: String },

    /// Service unavailable (dependency not configured)
    #[error("{message}")]
    ServiceUnavailable { message: String, details: String },

    /// Store layer error
    #[error("Store error")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("{0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Wrap a completion failure under a user-facing message
    pub fn llm(message: impl Into<String>, err: LlmError) -> Self {
        let message = message.into();
        match err {
            LlmError::MissingApiKey => ApiError::ServiceUnavailable {
                message,
                details: err.to_string(),
            },
            other => ApiError::Upstream {
                message,
                details: other.to_string(),
            },
        }
    }

    /// Wrap a fullnode failure under a user-facing message
    pub fn chain(message: impl Into<String>, err: ChainError) -> Self {
        match err {
            ChainError::InvalidArgument(details) => ApiError::Validation(details),
            ChainError::NotFound(details) => ApiError::NotFound(details),
            other => ApiError::Upstream {
                message: message.into(),
                details: other.to_string(),
            },
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::Upstream { details, .. } | ApiError::ServiceUnavailable { details, .. } => {
                Some(details.clone())
            }
            ApiError::Store(e) => Some(e.to_string()),
            ApiError::Io(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SandboxError::NoCode(_) | SandboxError::MissingParameters(_) => {
                ApiError::Validation(err.to_string())
            }
            SandboxError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            SandboxError::Generation(e) => ApiError::llm("Failed to generate code", e),
            SandboxError::Store(e) => ApiError::Store(e),
        }
    }
}

/// Error response body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub request_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::ServiceUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Store(StoreError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Store(StoreError::DuplicateId { .. })
            | ApiError::Store(StoreError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "CONFLICT")
            }
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let request_id = uuid::Uuid::new_v4().to_string();
        let details = self.details();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                details = ?details,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
            details,
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
