//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! Field names are camelCase on the wire.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assistant::Intent;
use crate::chain::GasEstimate;
use crate::sandbox::SandboxSimulation;
use crate::store::{ChatMessage, ChatRole};

// ============================================
// ENVELOPE
// ============================================

/// `{success: true, data, timestamp}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

/// Wrap `data` in the success envelope
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
        timestamp: Utc::now(),
    })
}

// ============================================
// CHAT DTOs
// ============================================

/// Prior turn supplied by the caller
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Falls back to the stored session when omitted
    #[serde(default)]
    pub conversation_history: Option<Vec<HistoryEntry>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub message: ChatMessage,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
}

// ============================================
// GENERATION DTOs
// ============================================

/// Body of `/token/generate`, `/pool/generate`, `/vault/generate`
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub parameters: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub code: String,
    pub parameters: Value,
}

// ============================================
// SANDBOX DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct SandboxTestRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSimulationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub struct GeneratedCodeResponse {
    pub code: String,
    pub simulation: SandboxSimulation,
}

// ============================================
// ASSET DTOs
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub icon_uri: Option<String>,
    #[serde(default)]
    pub project_uri: Option<String>,
}

/// Pools reference stored tokens by id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub name: String,
    pub token_a: String,
    pub token_b: String,
    pub fee: f64,
    #[serde(default)]
    pub liquidity: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVaultRequest {
    pub name: String,
    /// Stored token id
    pub token: String,
    #[serde(default)]
    pub apy: f64,
    #[serde(default)]
    pub total_value: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

// ============================================
// ASSISTANT DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub concept: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

// ============================================
// CHAIN DTOs
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub balance: String,
    pub formatted: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPriceResponse {
    pub network: String,
    #[serde(flatten)]
    pub estimate: GasEstimate,
}

#[derive(Debug, Deserialize)]
pub struct PayloadRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub parameters: Value,
}

// ============================================
// DASHBOARD / HEALTH DTOs
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub wallet_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub token_count: usize,
    pub pool_count: usize,
    pub vault_count: usize,
    pub active_pools: usize,
    pub simulation_count: usize,
    pub successful_simulations: usize,
    pub message_count: usize,
    pub recent_tokens: Vec<crate::store::Token>,
    pub recent_simulations: Vec<SandboxSimulation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub llm: String,
    pub chain: String,
    pub uptime_seconds: u64,
    pub version: String,
}
