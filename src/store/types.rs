//! Core record types held by the client store
//!
//! - `Token`, `Pool`, `Vault`: DeFi assets created by the user
//! - `User`, `WalletState`: who is connected
//! - `ChatMessage`, `ChatSession`: append-only conversation log
//! - `StoreEvent`: change notification published on every mutation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::sandbox::SandboxSimulation;

/// Generate a prefixed unique identifier (e.g. `msg_3f2a...`)
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// A fungible asset issued by the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Total supply in base units, kept as a decimal string
    pub total_supply: String,
    pub contract_address: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_uri: Option<String>,
}

impl Token {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        total_supply: impl Into<String>,
        contract_address: impl Into<String>,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id("token"),
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: total_supply.into(),
            contract_address: contract_address.into(),
            creator: creator.into(),
            created_at: Utc::now(),
            icon_uri: None,
            project_uri: None,
        }
    }

    /// Builder method: set icon URI
    pub fn icon_uri(mut self, uri: impl Into<String>) -> Self {
        self.icon_uri = Some(uri.into());
        self
    }

    /// Builder method: set project URI
    pub fn project_uri(mut self, uri: impl Into<String>) -> Self {
        self.project_uri = Some(uri.into());
        self
    }
}

/// A two-token liquidity pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub token_a: Token,
    pub token_b: Token,
    pub liquidity: String,
    /// Fee in percent (0.3 = 0.3%)
    pub fee: f64,
    pub contract_address: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Pool {
    pub fn new(
        name: impl Into<String>,
        token_a: Token,
        token_b: Token,
        fee: f64,
        contract_address: impl Into<String>,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id("pool"),
            name: name.into(),
            token_a,
            token_b,
            liquidity: "0".to_string(),
            fee,
            contract_address: contract_address.into(),
            creator: creator.into(),
            created_at: Utc::now(),
            is_active: true,
        }
    }

    /// Builder method: set liquidity
    pub fn liquidity(mut self, liquidity: impl Into<String>) -> Self {
        self.liquidity = liquidity.into();
        self
    }
}

/// A yield vault applying a strategy to deposits of one token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub id: String,
    pub name: String,
    pub token: Token,
    pub total_value: String,
    pub apy: f64,
    pub contract_address: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Vault {
    pub fn new(
        name: impl Into<String>,
        token: Token,
        apy: f64,
        contract_address: impl Into<String>,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id("vault"),
            name: name.into(),
            token,
            total_value: "0".to_string(),
            apy,
            contract_address: contract_address.into(),
            creator: creator.into(),
            created_at: Utc::now(),
            is_active: true,
        }
    }
}

/// The person using the assistant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default)]
    pub reputation: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            id: new_id("user"),
            address: address.into(),
            nickname: None,
            reputation: 0,
            created_at: Utc::now(),
        }
    }
}

/// Wallet connection status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
            ChatRole::System => write!(f, "system"),
        }
    }
}

/// Action a chat message is about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    CreateToken,
    CreatePool,
    CreateVault,
    Query,
}

/// Optional annotations on a chat message
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ChatAction>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// One entry in a chat session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: new_id("msg"),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Builder method: attach metadata
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Ordered conversation between the user and the assistant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("session"),
            user_id: user_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The full store contents
///
/// `loading` and `error` are runtime-only and never written to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub wallet: WalletState,
    #[serde(default)]
    pub current_session: Option<ChatSession>,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub vaults: Vec<Vault>,
    #[serde(default)]
    pub simulations: Vec<SandboxSimulation>,
    #[serde(skip)]
    pub loading: bool,
    #[serde(skip)]
    pub error: Option<String>,
}

/// Part of the store a change touched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StoreTopic {
    User,
    Wallet,
    Chat,
    Tokens,
    Pools,
    Vaults,
    Simulations,
}

impl StoreTopic {
    pub fn all() -> &'static [StoreTopic] {
        &[
            StoreTopic::User,
            StoreTopic::Wallet,
            StoreTopic::Chat,
            StoreTopic::Tokens,
            StoreTopic::Pools,
            StoreTopic::Vaults,
            StoreTopic::Simulations,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreTopic::User => "user",
            StoreTopic::Wallet => "wallet",
            StoreTopic::Chat => "chat",
            StoreTopic::Tokens => "tokens",
            StoreTopic::Pools => "pools",
            StoreTopic::Vaults => "vaults",
            StoreTopic::Simulations => "simulations",
        }
    }
}

impl std::fmt::Display for StoreTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the touched records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
    Replaced,
    Cleared,
}

/// Change notification published after every successful mutation
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreEvent {
    pub topic: StoreTopic,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StoreEvent {
    pub fn new(topic: StoreTopic, kind: ChangeKind, id: Option<String>) -> Self {
        Self {
            topic,
            kind,
            id,
            timestamp: Utc::now(),
        }
    }
}
