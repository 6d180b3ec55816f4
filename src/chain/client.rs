//! Aptos fullnode REST client
//!
//! Read-only: balances, transaction lookups and gas price. Writes go
//! through unsigned payloads (see `payload`).

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::format::is_valid_transaction_hash;
use crate::config::ChainConfig;

const APT_COIN_STORE: &str = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";

/// Known Aptos networks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Local,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Local => "local",
        }
    }

    pub fn default_node_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://fullnode.mainnet.aptoslabs.com/v1",
            Network::Testnet => "https://fullnode.testnet.aptoslabs.com/v1",
            Network::Devnet => "https://fullnode.devnet.aptoslabs.com/v1",
            Network::Local => "http://127.0.0.1:8080/v1",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "local" | "localnet" => Ok(Network::Local),
            other => Err(ChainError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Gas price estimate in octas per gas unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GasEstimate {
    pub gas_estimate: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprioritized_gas_estimate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioritized_gas_estimate: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    data: Value,
}

/// Client for one fullnode
pub struct ChainClient {
    client: Client,
    network: Network,
    node_url: String,
}

impl ChainClient {
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let network: Network = config.network.parse()?;
        let node_url = config
            .node_url
            .clone()
            .unwrap_or_else(|| network.default_node_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            network,
            node_url,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Check the node answers
    pub async fn health_check(&self) -> Result<(), ChainError> {
        self.get_json::<Value>(&format!("{}/-/healthy", self.node_url))
            .await
            .map(|_| ())
    }

    /// Balance in base units; `"0"` when the lookup fails
    ///
    /// Without `token_type` this reads the APT coin store, otherwise the
    /// first primary fungible store whose type mentions `token_type`.
    pub async fn account_balance(&self, address: &str, token_type: Option<&str>) -> String {
        let result = match token_type {
            None => self.apt_balance(address).await,
            Some(token) => self.fungible_balance(address, token).await,
        };

        match result {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(address, token = ?token_type, error = %e, "Balance lookup failed");
                "0".to_string()
            }
        }
    }

    async fn apt_balance(&self, address: &str) -> Result<String, ChainError> {
        let url = format!(
            "{}/accounts/{}/resource/{}",
            self.node_url,
            urlencoding::encode(address),
            urlencoding::encode(APT_COIN_STORE)
        );
        let resource: Resource = self.get_json(&url).await?;
        Ok(value_to_string(&resource.data["coin"]["value"]))
    }

    async fn fungible_balance(&self, address: &str, token: &str) -> Result<String, ChainError> {
        let url = format!(
            "{}/accounts/{}/resources",
            self.node_url,
            urlencoding::encode(address)
        );
        let resources: Vec<Resource> = self.get_json(&url).await?;

        Ok(resources
            .iter()
            .find(|r| {
                r.resource_type.contains("PrimaryFungibleStore")
                    && r.resource_type.contains(token)
            })
            .map(|r| value_to_string(&r.data["balance"]))
            .unwrap_or_else(|| "0".to_string()))
    }

    /// Transaction by hash; `None` when missing or the lookup fails
    pub async fn transaction_status(&self, hash: &str) -> Option<Value> {
        if !is_valid_transaction_hash(hash) {
            tracing::warn!(hash, "Refusing lookup of malformed transaction hash");
            return None;
        }
        let url = format!(
            "{}/transactions/by_hash/{}",
            self.node_url,
            urlencoding::encode(hash)
        );
        match self.get_json(&url).await {
            Ok(tx) => Some(tx),
            Err(e) => {
                tracing::warn!(hash, error = %e, "Transaction lookup failed");
                None
            }
        }
    }

    pub async fn estimate_gas_price(&self) -> Result<GasEstimate, ChainError> {
        self.get_json(&format!("{}/estimate_gas_price", self.node_url))
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ChainError> {
        tracing::debug!(url, "Fullnode request");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ChainError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChainError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

/// Fullnode amounts are u64 strings; accept bare numbers too
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => "0".to_string(),
    }
}

/// Errors from the chain layer
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Fullnode error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer one request with `body`; the handle yields the request line
    async fn serve_once(body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{}/v1", addr), handle)
    }

    fn client_for(node_url: String) -> ChainClient {
        let config = ChainConfig {
            node_url: Some(node_url),
            request_timeout_ms: 2_000,
            ..Default::default()
        };
        ChainClient::new(&config).unwrap()
    }

    #[test]
    fn test_network_urls() {
        let client = ChainClient::new(&ChainConfig::default()).unwrap();
        assert_eq!(client.network(), Network::Testnet);
        assert_eq!(client.node_url(), "https://fullnode.testnet.aptoslabs.com/v1");

        let config = ChainConfig {
            network: "mainnet".to_string(),
            node_url: Some("http://localhost:8080/v1/".to_string()),
            ..Default::default()
        };
        let client = ChainClient::new(&config).unwrap();
        assert_eq!(client.network(), Network::Mainnet);
        assert_eq!(client.node_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_unknown_network() {
        let config = ChainConfig {
            network: "moonnet".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ChainClient::new(&config),
            Err(ChainError::UnknownNetwork(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_lookups_degrade() {
        let config = ChainConfig {
            node_url: Some("http://127.0.0.1:1/v1".to_string()),
            request_timeout_ms: 500,
            ..Default::default()
        };
        let client = ChainClient::new(&config).unwrap();

        assert_eq!(client.account_balance("0x1", None).await, "0");
        assert!(client.transaction_status("0xabc").await.is_none());
        assert!(client.estimate_gas_price().await.is_err());
    }

    #[tokio::test]
    async fn test_transaction_lookup_stays_on_by_hash() {
        let (url, request_line) = serve_once(r#"{"hash":"0x1","success":true}"#).await;
        let client = client_for(url);

        // Rejected before any request is sent
        assert!(client.transaction_status("../../accounts/0x1").await.is_none());

        let hash = format!("0x{}", "ab".repeat(32));
        let tx = client.transaction_status(&hash).await.unwrap();
        assert_eq!(tx["success"], true);

        let line = request_line.await.unwrap();
        assert_eq!(line, format!("GET /v1/transactions/by_hash/{} HTTP/1.1", hash));
    }

    #[test]
    fn test_resource_parsing() {
        let raw = r#"{"type": "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>",
                      "data": {"coin": {"value": "12345"}, "frozen": false}}"#;
        let resource: Resource = serde_json::from_str(raw).unwrap();
        assert_eq!(value_to_string(&resource.data["coin"]["value"]), "12345");
    }
}
