//! Parameter validation
//!
//! Works on raw JSON so that every rule can report, not just the first
//! field serde would trip over.

use serde::Serialize;
use serde_json::Value;

use super::types::SimulationKind;

/// Outcome of checking a parameter set
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Required request keys per kind
pub fn required_fields(kind: SimulationKind) -> &'static [&'static str] {
    match kind {
        SimulationKind::Token => &["name", "symbol", "decimals", "totalSupply"],
        SimulationKind::Pool => &[
            "name",
            "tokenA",
            "tokenB",
            "fee",
            "initialLiquidityA",
            "initialLiquidityB",
        ],
        SimulationKind::Vault => &["name", "token", "strategy", "fee", "minDeposit"],
    }
}

/// Fail on the first key that is absent, null, `false` or an empty string
///
/// Numeric zero counts as present.
pub fn check_required_fields(params: &Value, fields: &[&str]) -> Result<(), String> {
    for field in fields {
        let present = match params.get(field) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(format!("Missing required field: {}", field));
        }
    }
    Ok(())
}

/// Check every rule for `kind` and collect all failures
pub fn validate_parameters(kind: SimulationKind, params: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    match kind {
        SimulationKind::Token => {
            if text(params, "name").is_empty() {
                errors.push("Token name is required".to_string());
            }
            let symbol_len = text(params, "symbol").chars().count();
            if !(1..=10).contains(&symbol_len) {
                errors.push("Token symbol must be 1-10 characters".to_string());
            }
            // Integer JSON number, as TokenParameters requires
            match params.get("decimals").and_then(Value::as_u64) {
                Some(d) if d <= 18 => {}
                _ => errors.push("Decimals must be between 0 and 18".to_string()),
            }
            if !positive(params, "totalSupply") {
                errors.push("Total supply must be greater than 0".to_string());
            }
        }
        SimulationKind::Pool => {
            if text(params, "name").is_empty() {
                errors.push("Pool name is required".to_string());
            }
            let token_a = text(params, "tokenA");
            let token_b = text(params, "tokenB");
            if token_a.is_empty() || token_b.is_empty() {
                errors.push("Both tokens are required".to_string());
            }
            if token_a == token_b {
                errors.push("Token A and Token B must be different".to_string());
            }
            if !fee_in_range(params) {
                errors.push("Fee must be between 0 and 100".to_string());
            }
            if !positive(params, "initialLiquidityA") {
                errors.push("Initial liquidity A must be greater than 0".to_string());
            }
            if !positive(params, "initialLiquidityB") {
                errors.push("Initial liquidity B must be greater than 0".to_string());
            }
        }
        SimulationKind::Vault => {
            if text(params, "name").is_empty() {
                errors.push("Vault name is required".to_string());
            }
            if text(params, "token").is_empty() {
                errors.push("Token is required".to_string());
            }
            if text(params, "strategy").is_empty() {
                errors.push("Strategy is required".to_string());
            }
            if !fee_in_range(params) {
                errors.push("Fee must be between 0 and 100".to_string());
            }
            if !positive(params, "minDeposit") {
                errors.push("Minimum deposit must be greater than 0".to_string());
            }
        }
    }

    ValidationReport::from_errors(errors)
}

fn text<'a>(params: &'a Value, key: &str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Numbers may arrive as JSON numbers or numeric strings
fn number(params: &Value, key: &str) -> Option<f64> {
    match params.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn positive(params: &Value, key: &str) -> bool {
    number(params, key).map(|n| n > 0.0).unwrap_or(false)
}

fn fee_in_range(params: &Value) -> bool {
    number(params, "fee")
        .map(|f| (0.0..=100.0).contains(&f))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::TokenParameters;
    use serde_json::json;

    #[test]
    fn test_required_fields_reject_missing_keys() {
        let full = json!({"name": "T", "symbol": "T", "decimals": 8, "totalSupply": "1"});
        assert!(check_required_fields(&full, required_fields(SimulationKind::Token)).is_ok());

        for field in required_fields(SimulationKind::Token) {
            let mut partial = full.clone();
            partial.as_object_mut().unwrap().remove(*field);
            let err = check_required_fields(&partial, required_fields(SimulationKind::Token))
                .unwrap_err();
            assert_eq!(err, format!("Missing required field: {}", field));
        }
    }

    #[test]
    fn test_required_fields_accept_zero() {
        let params = json!({"name": "T", "symbol": "T", "decimals": 0, "totalSupply": "1"});
        assert!(check_required_fields(&params, required_fields(SimulationKind::Token)).is_ok());

        let empty = json!({"name": "", "symbol": "T", "decimals": 0, "totalSupply": "1"});
        assert!(check_required_fields(&empty, required_fields(SimulationKind::Token)).is_err());
    }

    #[test]
    fn test_valid_token() {
        let report = validate_parameters(
            SimulationKind::Token,
            &json!({"name": "My Token", "symbol": "MTK", "decimals": 8, "totalSupply": "1000000"}),
        );
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn test_invalid_token_reports_every_rule() {
        let report = validate_parameters(
            SimulationKind::Token,
            &json!({"name": "", "symbol": "WAYTOOLONGSYM", "decimals": 19, "totalSupply": "0"}),
        );
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 4);
    }

    #[test]
    fn test_decimals_must_be_an_integer() {
        for decimals in [json!("8"), json!(8.5), json!(-1)] {
            let report = validate_parameters(
                SimulationKind::Token,
                &json!({"name": "T", "symbol": "T", "decimals": decimals, "totalSupply": "1"}),
            );
            assert_eq!(report.errors, vec!["Decimals must be between 0 and 18".to_string()]);
        }

        let params = json!({"name": "T", "symbol": "T", "decimals": 18, "totalSupply": "1"});
        let report = validate_parameters(SimulationKind::Token, &params);
        assert!(report.valid);
        assert!(serde_json::from_value::<TokenParameters>(params).is_ok());
    }

    #[test]
    fn test_pool_tokens_must_differ() {
        let report = validate_parameters(
            SimulationKind::Pool,
            &json!({
                "name": "P",
                "tokenA": "APT",
                "tokenB": "APT",
                "fee": 0.3,
                "initialLiquidityA": "10",
                "initialLiquidityB": 10
            }),
        );
        assert_eq!(report.errors, vec!["Token A and Token B must be different"]);
    }

    #[test]
    fn test_vault_fee_range() {
        let report = validate_parameters(
            SimulationKind::Vault,
            &json!({
                "name": "V",
                "token": "APT",
                "strategy": "compound",
                "fee": 101,
                "minDeposit": "100"
            }),
        );
        assert_eq!(report.errors, vec!["Fee must be between 0 and 100"]);
    }
}
