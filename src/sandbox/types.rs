//! Sandbox data types
//!
//! - `SimulationKind`: what is being built (token, pool, vault)
//! - `SimulationStatus`: forward-only pipeline state
//! - `SimulationParameters`: typed inputs for code generation
//! - `SandboxSimulation`: the record tracked through the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::store::new_id;

/// Kind of DeFi primitive a simulation builds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SimulationKind {
    Token,
    Pool,
    Vault,
}

impl SimulationKind {
    pub fn all() -> &'static [SimulationKind] {
        &[SimulationKind::Token, SimulationKind::Pool, SimulationKind::Vault]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationKind::Token => "token",
            SimulationKind::Pool => "pool",
            SimulationKind::Vault => "vault",
        }
    }

    /// Weight applied to the size-based gas estimate
    pub fn gas_multiplier(&self) -> f64 {
        match self {
            SimulationKind::Token => 1.0,
            SimulationKind::Pool => 1.5,
            SimulationKind::Vault => 2.0,
        }
    }
}

impl std::fmt::Display for SimulationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "token" => Ok(SimulationKind::Token),
            "pool" => Ok(SimulationKind::Pool),
            "vault" => Ok(SimulationKind::Vault),
            other => Err(format!(
                "Invalid simulation type '{}'. Valid types: token, pool, vault",
                other
            )),
        }
    }
}

/// Pipeline state of a simulation
///
/// Moves `Pending -> Compiling -> Success | Error` and never backwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    Pending,
    Compiling,
    Success,
    Error,
}

impl SimulationStatus {
    pub fn can_transition_to(self, next: SimulationStatus) -> bool {
        matches!(
            (self, next),
            (SimulationStatus::Pending, SimulationStatus::Compiling)
                | (SimulationStatus::Compiling, SimulationStatus::Success)
                | (SimulationStatus::Compiling, SimulationStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SimulationStatus::Success | SimulationStatus::Error)
    }
}

impl std::fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationStatus::Pending => write!(f, "pending"),
            SimulationStatus::Compiling => write!(f, "compiling"),
            SimulationStatus::Success => write!(f, "success"),
            SimulationStatus::Error => write!(f, "error"),
        }
    }
}

/// Accept amounts sent either as JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Inputs for token code generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenParameters {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(deserialize_with = "string_or_number")]
    pub total_supply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_uri: Option<String>,
}

/// Inputs for pool code generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolParameters {
    pub name: String,
    pub token_a: String,
    pub token_b: String,
    /// Fee in percent
    pub fee: f64,
    #[serde(deserialize_with = "string_or_number")]
    pub initial_liquidity_a: String,
    #[serde(deserialize_with = "string_or_number")]
    pub initial_liquidity_b: String,
}

/// Inputs for vault code generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VaultParameters {
    pub name: String,
    pub token: String,
    pub strategy: String,
    /// Fee in percent
    pub fee: f64,
    #[serde(deserialize_with = "string_or_number")]
    pub min_deposit: String,
}

/// Typed parameters of any simulation kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SimulationParameters {
    Token(TokenParameters),
    Pool(PoolParameters),
    Vault(VaultParameters),
}

impl SimulationParameters {
    /// Decode raw JSON parameters for a known kind
    pub fn from_value(
        kind: SimulationKind,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            SimulationKind::Token => SimulationParameters::Token(serde_json::from_value(value)?),
            SimulationKind::Pool => SimulationParameters::Pool(serde_json::from_value(value)?),
            SimulationKind::Vault => SimulationParameters::Vault(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> SimulationKind {
        match self {
            SimulationParameters::Token(_) => SimulationKind::Token,
            SimulationParameters::Pool(_) => SimulationKind::Pool,
            SimulationParameters::Vault(_) => SimulationKind::Vault,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SimulationParameters::Token(p) => &p.name,
            SimulationParameters::Pool(p) => &p.name,
            SimulationParameters::Vault(p) => &p.name,
        }
    }
}

/// Outcome of testing a simulation's code
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_estimate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
}

impl SimulationResult {
    /// A failed result carrying a single error message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

/// A mocked compile-and-cost run over generated code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SandboxSimulation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SimulationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<SimulationParameters>,
    #[serde(default)]
    pub code: String,
    pub status: SimulationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SimulationResult>,
    pub created_at: DateTime<Utc>,
}

impl SandboxSimulation {
    pub fn new(kind: SimulationKind, parameters: Option<SimulationParameters>) -> Self {
        Self {
            id: new_id("sim"),
            kind,
            parameters,
            code: String::new(),
            status: SimulationStatus::Pending,
            result: None,
            created_at: Utc::now(),
        }
    }

    /// Builder method: attach code
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

/// Partial update applied to a stored simulation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationUpdate {
    pub status: Option<SimulationStatus>,
    pub code: Option<String>,
    pub result: Option<SimulationResult>,
}

impl SimulationUpdate {
    /// Update carrying every mutable field of `sim`
    pub fn from_simulation(sim: &SandboxSimulation) -> Self {
        Self {
            status: Some(sim.status),
            code: Some(sim.code.clone()),
            result: sim.result.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        use SimulationStatus::*;
        assert!(Pending.can_transition_to(Compiling));
        assert!(Compiling.can_transition_to(Success));
        assert!(Compiling.can_transition_to(Error));

        assert!(!Pending.can_transition_to(Success));
        assert!(!Pending.can_transition_to(Error));
        assert!(!Compiling.can_transition_to(Pending));
        assert!(!Success.can_transition_to(Compiling));
        assert!(!Error.can_transition_to(Success));
        assert!(!Compiling.can_transition_to(Compiling));
    }

    #[test]
    fn test_terminal_states() {
        assert!(SimulationStatus::Success.is_terminal());
        assert!(SimulationStatus::Error.is_terminal());
        assert!(!SimulationStatus::Pending.is_terminal());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("Pool".parse::<SimulationKind>().unwrap(), SimulationKind::Pool);
        assert!("nft".parse::<SimulationKind>().is_err());
    }

    #[test]
    fn test_parameters_accept_numeric_amounts() {
        let params = SimulationParameters::from_value(
            SimulationKind::Token,
            serde_json::json!({
                "name": "My Token",
                "symbol": "MTK",
                "decimals": 8,
                "totalSupply": 1000000
            }),
        )
        .unwrap();

        match params {
            SimulationParameters::Token(p) => assert_eq!(p.total_supply, "1000000"),
            other => panic!("unexpected parameters: {:?}", other),
        }
    }

    #[test]
    fn test_untagged_parameters_pick_right_variant() {
        let vault: SimulationParameters = serde_json::from_value(serde_json::json!({
            "name": "My Vault",
            "token": "0x1::aptos_coin::AptosCoin",
            "strategy": "compound",
            "fee": 2.5,
            "minDeposit": "100"
        }))
        .unwrap();
        assert_eq!(vault.kind(), SimulationKind::Vault);

        let pool: SimulationParameters = serde_json::from_value(serde_json::json!({
            "name": "My Pool",
            "tokenA": "0x1::aptos_coin::AptosCoin",
            "tokenB": "0x123::my_token::MyToken",
            "fee": 0.3,
            "initialLiquidityA": "1000",
            "initialLiquidityB": "1000"
        }))
        .unwrap();
        assert_eq!(pool.kind(), SimulationKind::Pool);
    }

    #[test]
    fn test_simulation_serializes_type_field() {
        let sim = SandboxSimulation::new(SimulationKind::Pool, None);
        let json = serde_json::to_value(&sim).unwrap();
        assert_eq!(json["type"], "pool");
        assert_eq!(json["status"], "pending");
        assert!(sim.id.starts_with("sim_"));
    }
}
