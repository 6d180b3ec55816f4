//! Entry-function payload builder
//!
//! Builds unsigned `entry_function_payload` JSON for a wallet to sign.
//! Argument encoding follows the fullnode JSON rules: `vector<u8>` as
//! `0x`-hex, `u64` as a decimal string, `u8` as a number.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::client::ChainError;
use crate::config::ChainConfig;
use crate::sandbox::{PoolParameters, TokenParameters, VaultParameters};

/// Deployed module addresses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractAddresses {
    pub token: String,
    pub pool: String,
    pub vault: String,
}

impl From<&ChainConfig> for ContractAddresses {
    fn from(config: &ChainConfig) -> Self {
        Self {
            token: config.token_contract.clone(),
            pool: config.pool_contract.clone(),
            vault: config.vault_contract.clone(),
        }
    }
}

/// Unsigned transaction payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl EntryFunctionPayload {
    fn new(function: String, type_arguments: Vec<String>, arguments: Vec<Value>) -> Self {
        Self {
            payload_type: "entry_function_payload".to_string(),
            function,
            type_arguments,
            arguments,
        }
    }
}

/// `<token>::token::create_token(name, symbol, decimals, supply, icon_uri, project_uri)`
pub fn create_token(
    contracts: &ContractAddresses,
    params: &TokenParameters,
) -> Result<EntryFunctionPayload, ChainError> {
    Ok(EntryFunctionPayload::new(
        format!("{}::token::create_token", contracts.token),
        Vec::new(),
        vec![
            bytes_arg(&params.name),
            bytes_arg(&params.symbol),
            json!(params.decimals),
            u64_arg("totalSupply", &params.total_supply)?,
            bytes_arg(params.icon_uri.as_deref().unwrap_or("")),
            bytes_arg(params.project_uri.as_deref().unwrap_or("")),
        ],
    ))
}

/// `<pool>::liquidity_pool::create_pool<A, B>(name, fee_bps, liquidity_a, liquidity_b)`
pub fn create_pool(
    contracts: &ContractAddresses,
    params: &PoolParameters,
) -> Result<EntryFunctionPayload, ChainError> {
    Ok(EntryFunctionPayload::new(
        format!("{}::liquidity_pool::create_pool", contracts.pool),
        vec![params.token_a.clone(), params.token_b.clone()],
        vec![
            bytes_arg(&params.name),
            fee_arg(params.fee)?,
            u64_arg("initialLiquidityA", &params.initial_liquidity_a)?,
            u64_arg("initialLiquidityB", &params.initial_liquidity_b)?,
        ],
    ))
}

/// `<vault>::yield_vault::create_vault<T>(name, strategy, fee_bps, min_deposit)`
pub fn create_vault(
    contracts: &ContractAddresses,
    params: &VaultParameters,
) -> Result<EntryFunctionPayload, ChainError> {
    Ok(EntryFunctionPayload::new(
        format!("{}::yield_vault::create_vault", contracts.vault),
        vec![params.token.clone()],
        vec![
            bytes_arg(&params.name),
            bytes_arg(&params.strategy),
            fee_arg(params.fee)?,
            u64_arg("minDeposit", &params.min_deposit)?,
        ],
    ))
}

fn bytes_arg(text: &str) -> Value {
    Value::String(format!("0x{}", hex::encode(text.as_bytes())))
}

fn u64_arg(field: &str, amount: &str) -> Result<Value, ChainError> {
    amount
        .trim()
        .parse::<u64>()
        .map(|n| Value::String(n.to_string()))
        .map_err(|_| ChainError::InvalidArgument(format!("{} must be a u64 integer", field)))
}

/// Percent to basis points
fn fee_arg(fee: f64) -> Result<Value, ChainError> {
    if !(0.0..=100.0).contains(&fee) {
        return Err(ChainError::InvalidArgument(
            "fee must be between 0 and 100".to_string(),
        ));
    }
    Ok(Value::String(((fee * 100.0).round() as u64).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contracts() -> ContractAddresses {
        ContractAddresses::from(&ChainConfig::default())
    }

    #[test]
    fn test_token_payload() {
        let params = TokenParameters {
            name: "Gold".to_string(),
            symbol: "GLD".to_string(),
            decimals: 8,
            total_supply: "1000000".to_string(),
            icon_uri: None,
            project_uri: Some("https://gold.example".to_string()),
        };

        let payload = create_token(&contracts(), &params).unwrap();
        assert_eq!(payload.function, "0x1234567890abcdef::token::create_token");
        assert!(payload.type_arguments.is_empty());
        assert_eq!(payload.arguments[0], "0x476f6c64");
        assert_eq!(payload.arguments[2], 8);
        assert_eq!(payload.arguments[3], "1000000");
        assert_eq!(payload.arguments[4], "0x");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "entry_function_payload");
    }

    #[test]
    fn test_pool_payload_type_arguments() {
        let params = PoolParameters {
            name: "P".to_string(),
            token_a: "0x1::aptos_coin::AptosCoin".to_string(),
            token_b: "0x2::usdc::USDC".to_string(),
            fee: 0.3,
            initial_liquidity_a: "1000".to_string(),
            initial_liquidity_b: "2000".to_string(),
        };

        let payload = create_pool(&contracts(), &params).unwrap();
        assert_eq!(payload.type_arguments.len(), 2);
        assert_eq!(payload.arguments[1], "30");
        assert_eq!(payload.arguments[3], "2000");
    }

    #[test]
    fn test_rejects_bad_amounts() {
        let params = VaultParameters {
            name: "V".to_string(),
            token: "0x1::aptos_coin::AptosCoin".to_string(),
            strategy: "compound".to_string(),
            fee: 2.0,
            min_deposit: "1.5".to_string(),
        };
        assert!(matches!(
            create_vault(&contracts(), &params),
            Err(ChainError::InvalidArgument(_))
        ));

        let params = VaultParameters {
            min_deposit: "100".to_string(),
            fee: 150.0,
            ..params
        };
        assert!(create_vault(&contracts(), &params).is_err());
    }
}
