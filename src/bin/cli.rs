//! Aptos Assistant CLI
//!
//! Command-line client for a running Aptos Assistant API:
//! - Chat with the assistant
//! - Generate token, pool and vault modules
//! - Test Move code in the sandbox
//! - Inspect state and account balances

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aptos-assistant-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for the Aptos DeFi assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a chat message
    Chat {
        /// Message text
        message: Vec<String>,
    },

    /// Generate a fungible-asset module
    Token {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "8")]
        decimals: u8,
        /// Total supply in base units
        #[arg(long)]
        supply: String,
    },

    /// Generate a liquidity-pool module
    Pool {
        #[arg(long)]
        name: String,
        #[arg(long)]
        token_a: String,
        #[arg(long)]
        token_b: String,
        /// Fee in percent (0-100)
        #[arg(long, default_value = "0.3")]
        fee: f64,
        #[arg(long)]
        liquidity_a: String,
        #[arg(long)]
        liquidity_b: String,
    },

    /// Generate a yield-vault module
    Vault {
        #[arg(long)]
        name: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        strategy: String,
        /// Fee in percent (0-100)
        #[arg(long, default_value = "1")]
        fee: f64,
        #[arg(long)]
        min_deposit: String,
    },

    /// Test a Move source file in the sandbox
    Test {
        /// Path to the .move file
        path: PathBuf,
        /// Contract type (token, pool, vault)
        #[arg(short = 't', long = "type")]
        kind: String,
    },

    /// Validate creation parameters
    Validate {
        /// Contract type (token, pool, vault)
        #[arg(short = 't', long = "type")]
        kind: String,
        /// Parameters as a JSON object
        parameters: String,
    },

    /// Show the full client state
    State,

    /// List created tokens
    Tokens,

    /// List sandbox simulations
    Simulations,

    /// Show an account balance
    Balance {
        address: String,
        /// Token type (default: APT)
        #[arg(long)]
        token_type: Option<String>,
    },

    /// Show server health
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

struct Api {
    client: reqwest::Client,
    base: String,
}

impl Api {
    async fn get(&self, path: &str) -> Result<Value, Box<dyn std::error::Error>> {
        let response = self.client.get(format!("{}{}", self.base, path)).send().await?;
        unwrap_envelope(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, Box<dyn std::error::Error>> {
        let response = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await?;
        unwrap_envelope(response).await
    }
}

/// `data` of a success envelope; exits with the error message otherwise
async fn unwrap_envelope(response: reqwest::Response) -> Result<Value, Box<dyn std::error::Error>> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() && body["success"].as_bool().unwrap_or(false) {
        return Ok(body["data"].clone());
    }

    eprintln!(
        "Request failed ({}): {}",
        status,
        body["error"].as_str().unwrap_or("unknown error")
    );
    if let Some(details) = body["details"].as_str() {
        eprintln!("  {}", details);
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let api = Api {
        client: reqwest::Client::new(),
        base: format!("{}/api/v1", cli.api_url.trim_end_matches('/')),
    };
    let as_json = cli.format == "json";

    match cli.command {
        Commands::Chat { message } => {
            let data = api
                .post("/chat", json!({ "message": message.join(" ") }))
                .await?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{}", data["response"].as_str().unwrap_or_default());
                if let Some(action) = data["intent"]["kind"].as_str() {
                    println!();
                    println!("(detected intent: {})", action);
                }
            }
        }

        Commands::Token {
            name,
            symbol,
            decimals,
            supply,
        } => {
            let parameters = json!({
                "name": name,
                "symbol": symbol,
                "decimals": decimals,
                "totalSupply": supply,
            });
            let data = api.post("/token/generate", json!({ "parameters": parameters })).await?;
            print_code(&data, as_json)?;
        }

        Commands::Pool {
            name,
            token_a,
            token_b,
            fee,
            liquidity_a,
            liquidity_b,
        } => {
            let parameters = json!({
                "name": name,
                "tokenA": token_a,
                "tokenB": token_b,
                "fee": fee,
                "initialLiquidityA": liquidity_a,
                "initialLiquidityB": liquidity_b,
            });
            let data = api.post("/pool/generate", json!({ "parameters": parameters })).await?;
            print_code(&data, as_json)?;
        }

        Commands::Vault {
            name,
            token,
            strategy,
            fee,
            min_deposit,
        } => {
            let parameters = json!({
                "name": name,
                "token": token,
                "strategy": strategy,
                "fee": fee,
                "minDeposit": min_deposit,
            });
            let data = api.post("/vault/generate", json!({ "parameters": parameters })).await?;
            print_code(&data, as_json)?;
        }

        Commands::Test { path, kind } => {
            if !path.exists() {
                eprintln!("File not found: {:?}", path);
                std::process::exit(1);
            }
            let code = std::fs::read_to_string(&path)?;
            let data = api
                .post("/sandbox/test", json!({ "code": code, "type": kind }))
                .await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_simulation_result(&data);
            }
        }

        Commands::Validate { kind, parameters } => {
            let parameters: Value = serde_json::from_str(&parameters)?;
            let data = api
                .post("/sandbox/validate", json!({ "type": kind, "parameters": parameters }))
                .await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else if data["valid"].as_bool().unwrap_or(false) {
                println!("Parameters are valid");
            } else {
                println!("Invalid parameters:");
                for error in data["errors"].as_array().into_iter().flatten() {
                    println!("  - {}", error.as_str().unwrap_or_default());
                }
            }
        }

        Commands::State => {
            let data = api.get("/state").await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }

        Commands::Tokens => {
            let data = api.get("/tokens").await?;
            let tokens = data.as_array().cloned().unwrap_or_default();

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else if tokens.is_empty() {
                println!("No tokens created yet.");
            } else {
                println!("{:<24} {:<10} {:<10} {}", "Name", "Symbol", "Decimals", "Supply");
                println!("{}", "-".repeat(64));
                for token in tokens {
                    println!(
                        "{:<24} {:<10} {:<10} {}",
                        token["name"].as_str().unwrap_or("-"),
                        token["symbol"].as_str().unwrap_or("-"),
                        token["decimals"].as_u64().unwrap_or(0),
                        token["totalSupply"].as_str().unwrap_or("-"),
                    );
                }
            }
        }

        Commands::Simulations => {
            let data = api.get("/sandbox/simulations").await?;
            let simulations = data.as_array().cloned().unwrap_or_default();

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else if simulations.is_empty() {
                println!("No simulations yet.");
            } else {
                println!("{:<36} {:<8} {:<10} {}", "ID", "Type", "Status", "Gas");
                println!("{}", "-".repeat(64));
                for sim in simulations {
                    println!(
                        "{:<36} {:<8} {:<10} {}",
                        sim["id"].as_str().unwrap_or("-"),
                        sim["type"].as_str().unwrap_or("-"),
                        sim["status"].as_str().unwrap_or("-"),
                        sim["result"]["gasEstimate"]
                            .as_u64()
                            .map(|g| g.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    );
                }
            }
        }

        Commands::Balance {
            address,
            token_type,
        } => {
            let path = match &token_type {
                Some(t) => format!("/chain/balance/{}?tokenType={}", address, urlencoding::encode(t)),
                None => format!("/chain/balance/{}", address),
            };
            let data = api.get(&path).await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!(
                    "{} {}",
                    data["formatted"].as_str().unwrap_or("0"),
                    token_type.as_deref().unwrap_or("APT")
                );
            }
        }

        Commands::Status => {
            let response = api
                .client
                .get(format!("{}/health", cli.api_url.trim_end_matches('/')))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    println!("Aptos Assistant v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!("  Store: {}", health["store"].as_str().unwrap_or("-"));
                    println!("  Model: {}", health["llm"].as_str().unwrap_or("-"));
                    println!("  Chain: {}", health["chain"].as_str().unwrap_or("-"));

                    if let Some(uptime) = health["uptimeSeconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Aptos Assistant API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the API server is running:");
                    eprintln!("  cargo run --bin aptos-assistant");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = aptos_assistant::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_code(data: &Value, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(data)?);
    } else {
        println!("{}", data["code"].as_str().unwrap_or_default());
    }
    Ok(())
}

fn print_simulation_result(sim: &Value) {
    println!(
        "Simulation {}: {}",
        sim["id"].as_str().unwrap_or("-"),
        sim["status"].as_str().unwrap_or("unknown")
    );

    let result = &sim["result"];
    if let Some(gas) = result["gasEstimate"].as_u64() {
        println!("  Gas estimate: {}", gas);
    }
    for (label, key) in [("Error", "errors"), ("Warning", "warnings")] {
        for item in result[key].as_array().into_iter().flatten() {
            println!("  {}: {}", label, item.as_str().unwrap_or_default());
        }
    }
    if let Some(analysis) = result["aiAnalysis"].as_str() {
        println!();
        println!("{}", analysis);
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
