//! Mock compiler
//!
//! Stands in for the Move compiler: a fixed set of independent substring
//! checks plus a size-based gas estimate.

use serde::{Deserialize, Serialize};

use super::types::SimulationKind;

/// Base gas units per 1000 bytes of source
const BASE_GAS: f64 = 1000.0;

/// Result of a mock compilation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompileReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub gas_estimate: u64,
}

/// Run every predicate against `code`
pub fn compile(code: &str, kind: SimulationKind) -> CompileReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !code.contains("module") {
        errors.push("Missing module declaration".to_string());
    }

    if !code.contains("public entry fun") {
        errors.push("Missing public entry function".to_string());
    }

    match kind {
        SimulationKind::Token if !code.contains("fungible_asset") => {
            errors.push("Token code should use fungible_asset framework".to_string());
        }
        SimulationKind::Pool if !code.contains("liquidity") => {
            errors.push("Pool code should include liquidity management".to_string());
        }
        SimulationKind::Vault if !code.contains("yield") => {
            errors.push("Vault code should include yield strategy".to_string());
        }
        _ => {}
    }

    if code.contains("assert!") && !code.contains("error::") {
        warnings.push("Consider using proper error codes with assertions".to_string());
    }

    if !code.contains("signer::address_of") {
        warnings.push("Consider validating signer address".to_string());
    }

    CompileReport {
        success: errors.is_empty(),
        errors,
        warnings,
        gas_estimate: estimate_gas(code, kind),
    }
}

/// `round(1000 * len / 1000 * multiplier)`
pub fn estimate_gas(code: &str, kind: SimulationKind) -> u64 {
    let complexity = code.len() as f64 / 1000.0;
    (BASE_GAS * complexity * kind.gas_multiplier()).round() as u64
}
