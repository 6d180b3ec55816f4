//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// `host:port` to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Completion API configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_app_url")]
    pub app_url: String,

    #[serde(default = "default_llm_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_llm_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "qwen/qwen-2.5-coder-32b-instruct:free".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_llm_timeout() -> u64 {
    60_000
}

fn default_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            app_url: default_app_url(),
            request_timeout_ms: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Aptos network and contract configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_network")]
    pub network: String,

    /// Overrides the network's default fullnode URL
    #[serde(default)]
    pub node_url: Option<String>,

    #[serde(default = "default_contract")]
    pub token_contract: String,

    #[serde(default = "default_contract")]
    pub pool_contract: String,

    #[serde(default = "default_contract")]
    pub vault_contract: String,

    #[serde(default = "default_chain_timeout")]
    pub request_timeout_ms: u64,
}

fn default_network() -> String {
    "testnet".to_string()
}

fn default_contract() -> String {
    "0x1234567890abcdef".to_string()
}

fn default_chain_timeout() -> u64 {
    10_000
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            node_url: None,
            token_contract: default_contract(),
            pool_contract: default_contract(),
            vault_contract: default_contract(),
            request_timeout_ms: default_chain_timeout(),
        }
    }
}

/// Client store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_storage_name")]
    pub storage_name: String,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("aptos-assistant").to_string_lossy().to_string())
        .unwrap_or_else(|| "./aptos_assistant_data".to_string())
}

fn default_storage_name() -> String {
    "aptos-assistant-store".to_string()
}

fn default_event_capacity() -> usize {
    256
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_name: default_storage_name(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("aptos-assistant").join("config.toml")),
            Some(PathBuf::from("/etc/aptos-assistant/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // API overrides
        if let Ok(host) = std::env::var("APTOS_ASSISTANT_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("APTOS_ASSISTANT_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Completion API overrides
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(url) = std::env::var("OPENROUTER_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("OPENROUTER_MODEL") {
            self.llm.model = model;
        }
        if let Ok(app_url) = std::env::var("APP_URL") {
            self.llm.app_url = app_url;
        }

        // Chain overrides
        if let Ok(network) = std::env::var("APTOS_NETWORK") {
            self.chain.network = network;
        }
        if let Ok(node_url) = std::env::var("APTOS_NODE_URL") {
            self.chain.node_url = Some(node_url);
        }

        // Store overrides
        if let Ok(data_dir) = std::env::var("APTOS_ASSISTANT_DATA_DIR") {
            self.store.data_dir = data_dir;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("APTOS_ASSISTANT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("APTOS_ASSISTANT_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            llm: LlmConfig::default(),
            chain: ChainConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Aptos Assistant Configuration
#
# Environment variables override these settings:
# - APTOS_ASSISTANT_API_HOST
# - APTOS_ASSISTANT_API_PORT
# - APTOS_ASSISTANT_DATA_DIR
# - APTOS_ASSISTANT_LOG_LEVEL
# - APTOS_ASSISTANT_LOG_FORMAT
# - OPENROUTER_API_KEY, OPENROUTER_BASE_URL, OPENROUTER_MODEL, APP_URL
# - APTOS_NETWORK, APTOS_NODE_URL

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins (empty = permissive)
cors_origins = ["http://localhost:3000"]

# Request timeout in seconds
request_timeout_secs = 60

[llm]
# OpenAI-compatible completion endpoint
base_url = "https://openrouter.ai/api/v1"

# Bearer token (prefer OPENROUTER_API_KEY)
api_key = ""

# Model used for chat, code generation and review
model = "qwen/qwen-2.5-coder-32b-instruct:free"

temperature = 0.2
max_tokens = 2000

# Sent as HTTP-Referer
app_url = "http://localhost:3000"

request_timeout_ms = 60000
max_retries = 3

[chain]
# mainnet, testnet, devnet or local
network = "testnet"

# Optional fullnode override
# node_url = "https://fullnode.testnet.aptoslabs.com/v1"

# Deployed factory modules
token_contract = "0x1234567890abcdef"
pool_contract = "0x1234567890abcdef"
vault_contract = "0x1234567890abcdef"

request_timeout_ms = 10000

[store]
# Directory holding the persisted client store
data_dir = "~/.local/share/aptos-assistant"

# File stem of the persisted store
storage_name = "aptos-assistant-store"

# Buffered change events per subscriber
event_capacity = 256

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/aptos-assistant/aptos-assistant.log"
"#
    .to_string()
}
