//! Aptos Assistant REST API
//!
//! HTTP API layer, built with Axum. Every JSON response uses the
//! `{success, data | error}` envelope.
//!
//! # Endpoints
//!
//! ## Chat
//! - `POST /api/v1/chat` - Send a message
//! - `GET /api/v1/chat/session` - Current session
//! - `DELETE /api/v1/chat/session` - Clear the session
//!
//! ## Code generation
//! - `POST /api/v1/token/generate`
//! - `POST /api/v1/pool/generate`
//! - `POST /api/v1/vault/generate`
//!
//! ## Sandbox
//! - `POST /api/v1/sandbox/test` - Test code in one shot
//! - `POST /api/v1/sandbox/validate` - Validate parameters
//! - `GET|POST /api/v1/sandbox/simulations`
//! - `GET|DELETE /api/v1/sandbox/simulations/:id`
//! - `POST /api/v1/sandbox/simulations/:id/generate`
//! - `POST /api/v1/sandbox/simulations/:id/test`
//!
//! ## Store
//! - `GET|DELETE /api/v1/state`
//! - `GET|POST /api/v1/{tokens,pools,vaults}`, `DELETE /api/v1/{tokens,pools,vaults}/:id`
//! - `GET|PUT /api/v1/wallet`
//! - `GET /api/v1/dashboard`
//!
//! ## Assistant
//! - `POST /api/v1/assistant/explain`
//! - `POST /api/v1/assistant/recommend`
//! - `POST /api/v1/assistant/dialog`
//!
//! ## Chain
//! - `GET /api/v1/chain/balance/:address`
//! - `GET /api/v1/chain/transactions/:hash`
//! - `GET /api/v1/chain/gas-price`
//! - `POST /api/v1/chain/payload`
//!
//! ## Health
//! - `GET /health/live` - Liveness check
//! - `GET /health/ready` - Readiness check
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Store change stream

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.api);
    let timeout = Duration::from_secs(state.config.api.request_timeout_secs.max(1));

    let api_routes = Router::new()
        // Chat
        .route("/chat", post(routes::chat::send_message))
        .route(
            "/chat/session",
            get(routes::chat::get_session).delete(routes::chat::clear_session),
        )
        // Code generation
        .route("/token/generate", post(routes::generate::generate_token))
        .route("/pool/generate", post(routes::generate::generate_pool))
        .route("/vault/generate", post(routes::generate::generate_vault))
        // Sandbox
        .route("/sandbox/test", post(routes::sandbox::test_code))
        .route("/sandbox/validate", post(routes::sandbox::validate))
        .route(
            "/sandbox/simulations",
            get(routes::sandbox::list_simulations).post(routes::sandbox::create_simulation),
        )
        .route(
            "/sandbox/simulations/:id",
            get(routes::sandbox::get_simulation).delete(routes::sandbox::delete_simulation),
        )
        .route(
            "/sandbox/simulations/:id/generate",
            post(routes::sandbox::generate_simulation_code),
        )
        .route(
            "/sandbox/simulations/:id/test",
            post(routes::sandbox::test_simulation),
        )
        // Store
        .route(
            "/state",
            get(routes::assets::get_state).delete(routes::assets::clear_state),
        )
        .route(
            "/tokens",
            get(routes::assets::list_tokens).post(routes::assets::create_token),
        )
        .route("/tokens/:id", delete(routes::assets::delete_token))
        .route(
            "/pools",
            get(routes::assets::list_pools).post(routes::assets::create_pool),
        )
        .route("/pools/:id", delete(routes::assets::delete_pool))
        .route(
            "/vaults",
            get(routes::assets::list_vaults).post(routes::assets::create_vault),
        )
        .route("/vaults/:id", delete(routes::assets::delete_vault))
        .route(
            "/wallet",
            get(routes::assets::get_wallet).put(routes::assets::set_wallet),
        )
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        // Assistant
        .route("/assistant/explain", post(routes::assistant::explain))
        .route("/assistant/recommend", post(routes::assistant::recommend))
        .route("/assistant/dialog", post(routes::assistant::dialog_turn))
        // Chain
        .route("/chain/balance/:address", get(routes::chain::get_balance))
        .route("/chain/transactions/:hash", get(routes::chain::get_transaction))
        .route("/chain/gas-price", get(routes::chain::get_gas_price))
        .route("/chain/payload", post(routes::chain::build_payload))
        // Model calls can be slow; the upgrade route is excluded from the timeout
        .layer(TimeoutLayer::new(timeout))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive unless specific origins are configured
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
    }
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.api.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Aptos Assistant API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Aptos Assistant API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::Dialog;
    use crate::config::Config;
    use crate::llm::testing::ScriptedAssistant;
    use crate::llm::CodeAssistant;
    use crate::sandbox::{SandboxService, SimulationStatus};
    use crate::store::{ChatAction, ChatRole, StateStore, Token};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::RwLock;
    use tower::util::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<StateStore>,
        assistant: Arc<ScriptedAssistant>,
        dialogs: Arc<RwLock<HashMap<String, Dialog>>>,
        _dir: tempfile::TempDir,
    }

    async fn create_test_app_at(assistant: ScriptedAssistant, store_path: PathBuf, dir: TempDir) -> TestApp {
        let store = Arc::new(StateStore::open_at(store_path, 64).unwrap());
        let scripted = Arc::new(assistant);
        let assistant: Arc<dyn CodeAssistant> = scripted.clone();
        let sandbox =
            Arc::new(SandboxService::with_store(Arc::clone(&assistant), Arc::clone(&store)).await);

        let state = AppState::new(Config::default(), Arc::clone(&store), assistant, sandbox);
        let dialogs = Arc::clone(&state.dialogs);
        TestApp {
            router: build_router(state),
            store,
            assistant: scripted,
            dialogs,
            _dir: dir,
        }
    }

    async fn create_test_app_with(assistant: ScriptedAssistant) -> TestApp {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        create_test_app_at(assistant, path, dir).await
    }

    async fn create_test_app() -> TestApp {
        create_test_app_with(ScriptedAssistant::new()).await
    }

    async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn token_params() -> Value {
        json!({"name": "My Token", "symbol": "MTK", "decimals": 8, "totalSupply": "1000000"})
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app().await;
        let (status, _) = send(&app, "GET", "/health/live", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full_reports_missing_key() {
        let app = create_test_app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["llm"], "missing_api_key");
        assert_eq!(body["chain"], "disabled");
    }

    #[tokio::test]
    async fn test_chat_requires_message() {
        let app = create_test_app().await;
        let (status, body) = send(&app, "POST", "/api/v1/chat", Some(json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Message is required");
        assert!(body["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_chat_records_both_messages() {
        let app = create_test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/chat",
            Some(json!({"message": "Launch a new token named CryptoGold with a supply of 1000000"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["response"], "Sure, let's create it.");
        assert_eq!(body["data"]["message"]["metadata"]["action"], "create_token");

        let session = app.store.current_session().await.unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, ChatRole::User);
        assert_eq!(
            session.messages[1].metadata.as_ref().unwrap().action,
            Some(ChatAction::CreateToken)
        );
        assert!(!app.store.is_loading().await);
    }

    #[tokio::test]
    async fn test_chat_failure_records_apology() {
        let app = create_test_app_with(ScriptedAssistant::failing()).await;
        let (status, body) =
            send(&app, "POST", "/api/v1/chat", Some(json!({"message": "hello"}))).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Failed to process chat message");
        assert!(body["details"].is_string());

        let session = app.store.current_session().await.unwrap();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].role, ChatRole::Assistant);
        assert!(app.store.error().await.is_some());
    }

    #[tokio::test]
    async fn test_token_generate_rejects_missing_fields() {
        let app = create_test_app().await;

        for field in ["name", "symbol", "decimals", "totalSupply"] {
            let mut params = token_params();
            params.as_object_mut().unwrap().remove(field);

            let (status, body) = send(
                &app,
                "POST",
                "/api/v1/token/generate",
                Some(json!({ "parameters": params })),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], format!("Missing required field: {}", field));
        }

        let (status, _) = send(&app, "POST", "/api/v1/token/generate", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_token_generate() {
        let app = create_test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/token/generate",
            Some(json!({ "parameters": token_params() })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["code"].as_str().unwrap().contains("module"));
        assert_eq!(body["data"]["parameters"]["symbol"], "MTK");
    }

    #[tokio::test]
    async fn test_pool_generate_rejects_missing_fields() {
        let app = create_test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/pool/generate",
            Some(json!({"parameters": {"name": "P", "tokenA": "APT", "tokenB": "USDC", "fee": 0.3}})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: initialLiquidityA");
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let app = create_test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header("Content-Type", "application/json")
            .body(Body::from("not json"))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sandbox_test_flow() {
        let app = create_test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/sandbox/test",
            Some(json!({"code": "module x {}"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Code and type are required");

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/sandbox/test",
            Some(json!({"code": "module x {}", "type": "token"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "error");
        assert!(body["data"]["result"]["gasEstimate"].is_u64());

        let id = body["data"]["id"].as_str().unwrap();
        let stored = app.store.simulation(id).await.unwrap();
        assert_eq!(stored.status, SimulationStatus::Error);

        // The rejected request never reached the model; the test analyzed once
        assert_eq!(app.assistant.calls(), vec!["analyze_code:token".to_string()]);
    }

    #[tokio::test]
    async fn test_simulation_lifecycle() {
        let app = create_test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/sandbox/simulations",
            Some(json!({"type": "token", "parameters": token_params()})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sandbox/simulations/{}/generate", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["simulation"]["status"], "compiling");

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/sandbox/simulations/{}/test", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/sandbox/simulations/{}/test", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/v1/sandbox/simulations/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/sandbox/simulations/{}", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validate_parameters() {
        let app = create_test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/sandbox/validate",
            Some(json!({"type": "vault", "parameters": {"name": "V"}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["valid"], false);
        assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_token_and_pool_records() {
        let app = create_test_app().await;
        let apt = Token::new("Aptos", "APT", 8, "100", "0x1", "0x1");
        let usdc = Token::new("USD Coin", "USDC", 6, "100", "0x2", "0x2");
        app.store.add_token(apt.clone()).await.unwrap();
        app.store.add_token(usdc.clone()).await.unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/pools",
            Some(json!({"name": "APT/USDC", "tokenA": apt.id, "tokenB": usdc.id, "fee": 0.3})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["tokenB"]["symbol"], "USDC");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/pools",
            Some(json!({"name": "X", "tokenA": apt.id, "tokenB": "token_missing", "fee": 0.3})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/tokens/{}", apt.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.store.tokens().await.len(), 1);
        assert_eq!(app.store.pools().await.len(), 1);
    }

    #[tokio::test]
    async fn test_wallet_connect_sets_user() {
        let app = create_test_app().await;
        let (status, _) = send(
            &app,
            "PUT",
            "/api/v1/wallet",
            Some(json!({"connected": true, "address": "0xabc", "network": "testnet"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.store.user().await.unwrap().address, "0xabc");
        assert!(app.store.wallet().await.connected);
    }

    #[tokio::test]
    async fn test_payload_without_fullnode() {
        let app = create_test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/chain/payload",
            Some(json!({"type": "token", "parameters": token_params()})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["type"], "entry_function_payload");

        let address = format!("0x{}", "1".repeat(64));
        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/chain/balance/{}", address),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_chain_inputs_validated_before_lookup() {
        let app = create_test_app().await;

        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/chain/transactions/..%2F..%2Faccounts%2F0x1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid transaction hash"));

        let (status, _) = send(&app, "GET", "/api/v1/chain/transactions/0xabc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let address = format!("0x{}", "1".repeat(64));
        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/v1/chain/balance/{}?decimals=19", address),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Decimals must be between 0 and 18");
    }

    #[tokio::test]
    async fn test_dialog_turns() {
        let app = create_test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/assistant/dialog",
            Some(json!({"sessionId": "s1", "message": "create pool please"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"]["state"], "collecting");
        assert_eq!(body["data"]["state"]["waiting_for"], "token1");
        assert_eq!(app.dialogs.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_finished_dialogs_are_dropped() {
        let app = create_test_app().await;
        let turn = |session: &str, message: &str| {
            json!({"sessionId": session, "message": message})
        };

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/assistant/dialog",
            Some(turn("confirmed", "Create a liquidity pool with APT and USDC at 7% APY")),
        )
        .await;
        assert_eq!(body["data"]["state"]["state"], "awaiting_confirmation");
        assert_eq!(app.dialogs.read().await.len(), 1);

        let (status, body) = send(&app, "POST", "/api/v1/assistant/dialog", Some(turn("confirmed", "yes"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"]["state"], "idle");
        assert!(app.dialogs.read().await.is_empty());

        send(&app, "POST", "/api/v1/assistant/dialog", Some(turn("cancelled", "create pool please"))).await;
        assert_eq!(app.dialogs.read().await.len(), 1);
        let (_, body) = send(&app, "POST", "/api/v1/assistant/dialog", Some(turn("cancelled", "cancel"))).await;
        assert_eq!(body["data"]["state"]["state"], "idle");
        assert!(app.dialogs.read().await.is_empty());

        // Unrecognized input never opens a dialog
        for i in 0..10 {
            send(&app, "POST", "/api/v1/assistant/dialog", Some(turn(&format!("s{}", i), "hello there"))).await;
        }
        assert!(app.dialogs.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_state() {
        let app = create_test_app().await;
        send(&app, "POST", "/api/v1/chat", Some(json!({"message": "hi"}))).await;

        let (status, _) = send(&app, "DELETE", "/api/v1/state", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(app.store.current_session().await.is_none());

        let (_, body) = send(&app, "GET", "/api/v1/state", None).await;
        assert_eq!(body["data"]["tokens"], json!([]));
        assert_eq!(body["data"]["loading"], false);
    }
}
