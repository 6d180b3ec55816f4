//! Prompt templates
//!
//! Each function builds the full message list for one kind of request.

use crate::llm::client::CompletionMessage;
use crate::sandbox::{PoolParameters, SimulationKind, TokenParameters, VaultParameters};

const ASSISTANT_SYSTEM: &str = "You are an Aptos DeFi assistant. You help users create \
fungible tokens, liquidity pools and yield vaults with Move smart contracts.

- Ask for missing parameters one at a time and explain what each one means.
- Keep explanations short and plain; confirm before proceeding.
- Politely steer questions about other chains back to Aptos.

Operations and their parameters:
- Token: name, symbol, decimals, total supply, icon URI, project URI
- Pool: name, token A, token B, fee percentage, initial liquidity
- Vault: name, token, strategy, fee, minimum deposit";

const GENERATOR_RULES: &str = "Requirements:
1. Use the current Aptos framework APIs
2. Validate inputs and use error codes from std::error
3. Expose a public entry function
4. Use the parameters exactly as given";

/// Chat turn: system prompt, prior history, then the new user message
pub fn chat(message: &str, history: &[CompletionMessage]) -> Vec<CompletionMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(CompletionMessage::system(ASSISTANT_SYSTEM));
    messages.extend_from_slice(history);
    messages.push(CompletionMessage::user(message));
    messages
}

pub fn token_code(params: &TokenParameters) -> Vec<CompletionMessage> {
    let system = format!(
        "You are a Move developer specialising in Aptos fungible assets. \
Generate Move code that creates this token.\n\n{}\n\nParameters:\n\
- Name: {}\n- Symbol: {}\n- Decimals: {}\n- Total Supply: {}\n- Icon URI: {}\n- Project URI: {}",
        GENERATOR_RULES,
        params.name,
        params.symbol,
        params.decimals,
        params.total_supply,
        params.icon_uri.as_deref().unwrap_or("Not provided"),
        params.project_uri.as_deref().unwrap_or("Not provided"),
    );

    vec![
        CompletionMessage::system(system),
        CompletionMessage::user(format!(
            "Generate Move code for creating a token with these parameters: {}",
            serde_json::to_string(params).unwrap_or_default()
        )),
    ]
}

pub fn pool_code(params: &PoolParameters) -> Vec<CompletionMessage> {
    let system = format!(
        "You are a Move developer specialising in Aptos liquidity pools. \
Generate Move code that creates this pool.\n\n{}\n\nParameters:\n\
- Name: {}\n- Token A: {}\n- Token B: {}\n- Fee: {}%\n\
- Initial Liquidity A: {}\n- Initial Liquidity B: {}",
        GENERATOR_RULES,
        params.name,
        params.token_a,
        params.token_b,
        params.fee,
        params.initial_liquidity_a,
        params.initial_liquidity_b,
    );

    vec![
        CompletionMessage::system(system),
        CompletionMessage::user(format!(
            "Generate Move code for creating a liquidity pool with these parameters: {}",
            serde_json::to_string(params).unwrap_or_default()
        )),
    ]
}

pub fn vault_code(params: &VaultParameters) -> Vec<CompletionMessage> {
    let system = format!(
        "You are a Move developer specialising in Aptos yield vaults. \
Generate Move code that creates this vault.\n\n{}\n\nParameters:\n\
- Name: {}\n- Token: {}\n- Strategy: {}\n- Fee: {}%\n- Minimum Deposit: {}",
        GENERATOR_RULES,
        params.name,
        params.token,
        params.strategy,
        params.fee,
        params.min_deposit,
    );

    vec![
        CompletionMessage::system(system),
        CompletionMessage::user(format!(
            "Generate Move code for creating a yield vault with these parameters: {}",
            serde_json::to_string(params).unwrap_or_default()
        )),
    ]
}

pub fn analysis(code: &str, kind: SimulationKind) -> Vec<CompletionMessage> {
    vec![
        CompletionMessage::system(format!(
            "You are a Move auditor. Review this {} creation code for compilation issues, \
security vulnerabilities, best-practice violations, gas optimisations and missing error \
handling. Give specific, actionable feedback.",
            kind
        )),
        CompletionMessage::user(format!(
            "Please analyze this Move code for {} creation:\n\n{}",
            kind, code
        )),
    ]
}

pub fn explanation(concept: &str) -> Vec<CompletionMessage> {
    vec![
        CompletionMessage::system(
            "You are a DeFi educator focused on Aptos. Explain concepts for beginners \
with simple analogies and a practical example.",
        ),
        CompletionMessage::user(format!("Explain this DeFi concept: {}", concept)),
    ]
}

pub fn recommendations(context: &str) -> Vec<CompletionMessage> {
    vec![
        CompletionMessage::system(
            "You are a DeFi strategist. Give Aptos-specific recommendations that weigh \
risk tolerance and experience, list both opportunities and warnings, and end with \
concrete next steps.",
        ),
        CompletionMessage::user(format!("Provide DeFi recommendations for: {}", context)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MessageRole;

    #[test]
    fn test_chat_wraps_history() {
        let history = vec![
            CompletionMessage::user("I want a token"),
            CompletionMessage::assistant("What should it be called?"),
        ];
        let messages = chat("CryptoGold", &history);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1], history[0]);
        assert_eq!(messages[3].content, "CryptoGold");
    }

    #[test]
    fn test_token_prompt_includes_parameters() {
        let params = TokenParameters {
            name: "CryptoGold".to_string(),
            symbol: "CGLD".to_string(),
            decimals: 8,
            total_supply: "1000000".to_string(),
            icon_uri: None,
            project_uri: None,
        };
        let messages = token_code(&params);

        assert!(messages[0].content.contains("Symbol: CGLD"));
        assert!(messages[0].content.contains("Icon URI: Not provided"));
        assert!(messages[1].content.contains("\"totalSupply\":\"1000000\""));
    }

    #[test]
    fn test_analysis_names_kind() {
        let messages = analysis("module x {}", SimulationKind::Vault);
        assert!(messages[1].content.contains("vault creation"));
        assert!(messages[1].content.ends_with("module x {}"));
    }
}
