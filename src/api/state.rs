//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::assistant::Dialog;
use crate::chain::{ChainClient, ContractAddresses};
use crate::config::Config;
use crate::llm::CodeAssistant;
use crate::sandbox::SandboxService;
use crate::store::StateStore;

/// Shared application state for all handlers
pub struct AppState {
    /// Persisted client state
    pub store: Arc<StateStore>,
    /// Simulation pipeline (mirrors into `store`)
    pub sandbox: Arc<SandboxService>,
    /// Language model behind chat and code generation
    pub assistant: Arc<dyn CodeAssistant>,
    /// Fullnode client; chain routes answer 503 without one
    pub chain: Option<Arc<ChainClient>>,
    pub contracts: ContractAddresses,
    pub config: Arc<Config>,
    /// Dialog state per conversation id
    pub dialogs: Arc<RwLock<HashMap<String, Dialog>>>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<StateStore>,
        assistant: Arc<dyn CodeAssistant>,
        sandbox: Arc<SandboxService>,
    ) -> Self {
        Self {
            store,
            sandbox,
            assistant,
            chain: None,
            contracts: ContractAddresses::from(&config.chain),
            config: Arc::new(config),
            dialogs: Arc::new(RwLock::new(HashMap::new())),
            start_time: Instant::now(),
        }
    }

    /// Attach a fullnode client
    pub fn with_chain(mut self, chain: Arc<ChainClient>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Whether a completion API key is configured
    pub fn llm_configured(&self) -> bool {
        !self.config.llm.api_key.trim().is_empty()
    }
}
