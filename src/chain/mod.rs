//! Aptos chain adapter
//!
//! - **client**: Fullnode REST reads (balances, transactions, gas price)
//! - **payload**: Unsigned entry-function payloads for token, pool and vault creation
//! - **format**: Address and amount helpers

pub mod client;
pub mod format;
pub mod payload;

pub use client::{ChainClient, ChainError, GasEstimate, Network};
pub use payload::{ContractAddresses, EntryFunctionPayload};
