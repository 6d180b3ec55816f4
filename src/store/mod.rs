//! Client Store
//!
//! This module holds everything the assistant remembers between requests:
//!
//! - **types**: Records (Token, Pool, Vault, ChatSession, ...)
//! - **engine**: The observable, persisted `StateStore`
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Mutation:
//!   handler → StateStore (RwLock) → JSON file (temp + rename) → broadcast StoreEvent
//!
//! Read:
//!   handler → StateStore (shared lock) → clone
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use aptos_assistant::store::{StateStore, Token};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = StateStore::open_at("./data/aptos-assistant-store.json", 64)?;
//!
//!     store.add_token(Token::new("My Token", "MTK", 8, "1000000", "0x1", "0xabc")).await?;
//!     println!("{} tokens", store.tokens().await.len());
//!
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod types;

pub use engine::StateStore;
pub use error::{StoreError, StoreResult};
pub use types::{
    new_id, ChangeKind, ChatAction, ChatMessage, ChatRole, ChatSession, MessageMetadata, Pool,
    StoreEvent, StoreState, StoreTopic, Token, User, Vault, WalletState,
};
