//! # Aptos Assistant
//!
//! Backend for an AI assistant that helps users design DeFi assets on Aptos:
//! chat with a hosted model, generate Move modules for tokens, liquidity
//! pools and yield vaults, sandbox-test the generated code, and keep the
//! client's state (wallet, chat session, created assets, simulations).
//!
//! ## Modules
//!
//! - [`store`]: Persisted client state with change events
//! - [`llm`]: Completion API client and the [`CodeAssistant`] seam
//! - [`sandbox`]: Simulation lifecycle, static compile checks, parameter validation
//! - [`assistant`]: Intent recognition and the guided creation dialog
//! - [`chain`]: Aptos fullnode reads, payload builders, display formatting
//! - [`api`]: REST API server with Axum
//! - [`websocket`]: Store change stream
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aptos_assistant::{LlmClient, SandboxService, SimulationKind, StateStore, StoreConfig};
//! use aptos_assistant::config::LlmConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(StateStore::open(&StoreConfig::default())?);
//!     let assistant = Arc::new(LlmClient::new(LlmConfig::default())?);
//!     let sandbox = SandboxService::with_store(assistant, store).await;
//!
//!     let sim = sandbox
//!         .test_source(SimulationKind::Token, "module 0x1::coin { public entry fun mint() {} }")
//!         .await?;
//!     println!("{} -> {:?}", sim.id, sim.status);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod assistant;
pub mod chain;
pub mod config;
pub mod llm;
pub mod sandbox;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiError, AppState};

pub use assistant::{recognize_intent, Dialog, DialogState, Intent, IntentKind};

pub use chain::{ChainClient, ChainError, ContractAddresses, EntryFunctionPayload, Network};

pub use config::{
    ApiConfig, ChainConfig, Config, ConfigError, LlmConfig, LoggingConfig, StoreConfig,
};

pub use llm::{CodeAssistant, LlmClient, LlmError};

pub use sandbox::{
    compile, validate_parameters, CompileReport, SandboxError, SandboxService, SandboxSimulation,
    SimulationKind, SimulationParameters, SimulationStatus,
};

pub use store::{StateStore, StoreError, StoreEvent, StoreState, StoreTopic};

pub use websocket::{websocket_handler, ClientMessage, ServerMessage};
