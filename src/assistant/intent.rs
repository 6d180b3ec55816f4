//! Intent recognition
//!
//! Matches a message against a handful of worked examples, then falls back
//! to keyword rules with regex entity extraction.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::store::ChatAction;

/// What the user is trying to do
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    CreatePool,
    CreateToken,
    CreateVault,
    JoinPool,
    QueryInfo,
    GeneralHelp,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::CreatePool => "create_pool",
            IntentKind::CreateToken => "create_token",
            IntentKind::CreateVault => "create_vault",
            IntentKind::JoinPool => "join_pool",
            IntentKind::QueryInfo => "query_info",
            IntentKind::GeneralHelp => "general_help",
        }
    }

    /// Entities that must be collected before the action can run
    pub fn required_entities(&self) -> &'static [&'static str] {
        match self {
            IntentKind::CreatePool => &["token1", "token2", "apy"],
            IntentKind::CreateToken => &["token_name", "supply"],
            IntentKind::CreateVault => &["token", "strategy"],
            IntentKind::JoinPool => &["pool_id"],
            IntentKind::QueryInfo => &["entity_type", "entity_id"],
            IntentKind::GeneralHelp => &[],
        }
    }

    /// Whether the dialog collects entities and asks for confirmation
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            IntentKind::CreatePool | IntentKind::CreateToken | IntentKind::CreateVault
        )
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity name to extracted value
pub type Entities = BTreeMap<String, String>;

/// A recognized intent and whatever entities could be extracted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Intent {
    pub kind: IntentKind,
    pub entities: Entities,
}

impl Intent {
    pub fn new(kind: IntentKind, entities: Entities) -> Self {
        Self { kind, entities }
    }

    /// Chat metadata tag for this intent
    pub fn action(&self) -> Option<ChatAction> {
        match self.kind {
            IntentKind::CreateToken => Some(ChatAction::CreateToken),
            IntentKind::CreatePool => Some(ChatAction::CreatePool),
            IntentKind::CreateVault => Some(ChatAction::CreateVault),
            IntentKind::QueryInfo => Some(ChatAction::Query),
            IntentKind::JoinPool | IntentKind::GeneralHelp => None,
        }
    }

    /// First required entity that is still missing or empty
    pub fn missing_entity(&self) -> Option<&'static str> {
        self.kind
            .required_entities()
            .iter()
            .copied()
            .find(|name| self.entities.get(*name).map_or(true, |v| v.is_empty()))
    }
}

struct Example {
    text: &'static str,
    kind: IntentKind,
    entities: &'static [(&'static str, &'static str)],
}

const EXAMPLES: &[Example] = &[
    Example {
        text: "Create a liquidity pool with APT and USDC at 7% APY",
        kind: IntentKind::CreatePool,
        entities: &[("token1", "APT"), ("token2", "USDC"), ("apy", "7")],
    },
    Example {
        text: "Launch a new token named CryptoGold with a supply of 1000000",
        kind: IntentKind::CreateToken,
        entities: &[("token_name", "CryptoGold"), ("supply", "1000000")],
    },
    Example {
        text: "Create a yield vault for APT with a compound strategy",
        kind: IntentKind::CreateVault,
        entities: &[("token", "APT"), ("strategy", "compound")],
    },
    Example {
        text: "Join pool 12345",
        kind: IntentKind::JoinPool,
        entities: &[("pool_id", "12345")],
    },
    Example {
        text: "What is the status of token CryptoGold?",
        kind: IntentKind::QueryInfo,
        entities: &[("entity_type", "token"), ("entity_id", "CryptoGold")],
    },
    Example {
        text: "Help me with DeFi basics",
        kind: IntentKind::GeneralHelp,
        entities: &[],
    },
];

/// Classify a message; `None` when nothing matches
pub fn recognize_intent(text: &str) -> Option<Intent> {
    let lower = text.to_lowercase();

    for example in EXAMPLES {
        let example_lower = example.text.to_lowercase();
        let matches = lower.contains(&example_lower)
            || example_lower.split_whitespace().all(|word| lower.contains(word));
        if matches {
            let entities = example
                .entities
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            return Some(Intent::new(example.kind, entities));
        }
    }

    if lower.contains("create pool") || lower.contains("liquidity pool") {
        return Some(Intent::new(IntentKind::CreatePool, extract_pool_entities(text)));
    }
    if lower.contains("create token") || lower.contains("launch token") {
        return Some(Intent::new(IntentKind::CreateToken, extract_token_entities(text)));
    }
    if lower.contains("create vault") || lower.contains("yield vault") {
        return Some(Intent::new(IntentKind::CreateVault, extract_vault_entities(text)));
    }
    if lower.contains("join pool") {
        return Some(Intent::new(IntentKind::JoinPool, extract_join_pool_entities(text)));
    }
    if let Some(entities) = extract_query_entities(text) {
        return Some(Intent::new(IntentKind::QueryInfo, entities));
    }
    if lower.contains("help") {
        return Some(Intent::new(IntentKind::GeneralHelp, Entities::new()));
    }

    None
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b[A-Z]{2,5}\b")
}

fn insert_match(entities: &mut Entities, key: &str, re: &Regex, text: &str) {
    if let Some(caps) = re.captures(text) {
        entities.insert(key.to_string(), caps[1].to_string());
    }
}

/// Upper-case 2-5 letter symbols and an `N%` rate
pub fn extract_pool_entities(text: &str) -> Entities {
    static APY: OnceLock<Regex> = OnceLock::new();

    let mut entities = Entities::new();
    let mut symbols = symbol_re()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|s| *s != "APY");
    if let Some(first) = symbols.next() {
        entities.insert("token1".to_string(), first.to_string());
    }
    if let Some(second) = symbols.next() {
        entities.insert("token2".to_string(), second.to_string());
    }
    insert_match(&mut entities, "apy", regex(&APY, r"(\d+(?:\.\d+)?)%"), text);
    entities
}

/// `named X` and `supply of N`
pub fn extract_token_entities(text: &str) -> Entities {
    static NAME: OnceLock<Regex> = OnceLock::new();
    static SUPPLY: OnceLock<Regex> = OnceLock::new();

    let mut entities = Entities::new();
    insert_match(&mut entities, "token_name", regex(&NAME, r"named (\w+)"), text);
    insert_match(&mut entities, "supply", regex(&SUPPLY, r"supply of (\d+)"), text);
    entities
}

/// First symbol and `<word> strategy`
pub fn extract_vault_entities(text: &str) -> Entities {
    static STRATEGY: OnceLock<Regex> = OnceLock::new();

    let mut entities = Entities::new();
    if let Some(symbol) = symbol_re().find(text) {
        entities.insert("token".to_string(), symbol.as_str().to_string());
    }
    insert_match(
        &mut entities,
        "strategy",
        regex(&STRATEGY, r"(?i)(\w+) strategy"),
        text,
    );
    entities
}

/// `pool N`
pub fn extract_join_pool_entities(text: &str) -> Entities {
    static POOL_ID: OnceLock<Regex> = OnceLock::new();

    let mut entities = Entities::new();
    insert_match(&mut entities, "pool_id", regex(&POOL_ID, r"(?i)pool (\d+)"), text);
    entities
}

/// `status of <token|pool|vault> X`
fn extract_query_entities(text: &str) -> Option<Entities> {
    static QUERY: OnceLock<Regex> = OnceLock::new();

    let caps = regex(&QUERY, r"(?i)(?:status|info) (?:of|for|on) (token|pool|vault) (\w+)")
        .captures(text)?;
    let mut entities = Entities::new();
    entities.insert("entity_type".to_string(), caps[1].to_lowercase());
    entities.insert("entity_id".to_string(), caps[2].to_string());
    Some(entities)
}
