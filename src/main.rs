//! Aptos Assistant API Server
//!
//! Run with: cargo run --bin aptos-assistant -- --config config.toml
//!
//! # Configuration
//!
//! Read from `--config`, or from the default locations (see
//! [`Config::load_default`]). Environment variables override the file:
//! - `APTOS_ASSISTANT_API_HOST`, `APTOS_ASSISTANT_API_PORT`
//! - `APTOS_ASSISTANT_DATA_DIR`
//! - `APTOS_ASSISTANT_LOG_LEVEL`, `APTOS_ASSISTANT_LOG_FORMAT`
//! - `OPENROUTER_API_KEY`, `OPENROUTER_BASE_URL`, `OPENROUTER_MODEL`
//! - `APTOS_NETWORK`, `APTOS_NODE_URL`
//! - `RUST_LOG`: Overrides the log filter

use aptos_assistant::api::{serve, AppState};
use aptos_assistant::chain::ChainClient;
use aptos_assistant::config::{Config, LoggingConfig};
use aptos_assistant::llm::{CodeAssistant, LlmClient};
use aptos_assistant::sandbox::SandboxService;
use aptos_assistant::store::StateStore;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "aptos-assistant")]
#[command(about = "Aptos DeFi assistant API server", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }

    let _guard = init_tracing(&config.logging)?;

    tracing::info!("Starting Aptos Assistant API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.store.data_dir);

    std::fs::create_dir_all(&config.store.data_dir)?;
    let store = Arc::new(StateStore::open(&config.store)?);
    tracing::info!(path = %store.path().display(), "State store opened");

    let llm = LlmClient::new(config.llm.clone())?;
    if llm.is_configured() {
        match llm.health_check().await {
            Ok(()) => tracing::info!(model = %config.llm.model, "Completion API reachable"),
            Err(e) => tracing::warn!("Completion API not available: {}", e),
        }
    } else {
        tracing::warn!("No completion API key configured (set OPENROUTER_API_KEY); chat and generation will fail");
    }
    let assistant: Arc<dyn CodeAssistant> = Arc::new(llm);
    let sandbox = Arc::new(SandboxService::with_store(Arc::clone(&assistant), Arc::clone(&store)).await);

    let chain = match ChainClient::new(&config.chain) {
        Ok(client) => {
            tracing::info!(network = %client.network(), node = %client.node_url(), "Chain client ready");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("Chain client disabled: {}", e);
            None
        }
    };

    let mut state = AppState::new(config, store, assistant, sandbox);
    if let Some(chain) = chain {
        state = state.with_chain(chain);
    }

    serve(state).await?;

    tracing::info!("Aptos Assistant API server stopped");
    Ok(())
}

/// Console output in the configured format, plus an optional JSON log file
fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "aptos_assistant={level},aptos_assistant_cli={level},tower_http=info",
            level = config.level
        ))
    });

    let json = config.format.eq_ignore_ascii_case("json");
    let pretty_layer = (!json).then(tracing_subscriber::fmt::layer);
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());

    let (file_layer, guard) = match &config.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            std::fs::create_dir_all(dir)?;
            let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "aptos-assistant.log".into());

            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
