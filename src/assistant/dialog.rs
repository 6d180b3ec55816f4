//! Multi-turn dialog
//!
//! Collects the entities a creation intent needs one question at a time,
//! then asks for confirmation.
//!
//! ```text
//! Idle ──creation intent──▶ Collecting ──all entities──▶ AwaitingConfirmation
//!   ▲                          │ cancel                      │ yes / no
//!   └──────────────────────────┴─────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use super::intent::{recognize_intent, Intent, IntentKind};

const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that. Could you please rephrase?";
const CONFIRMED: &str = "Confirmed. Processing your request now...";
const CANCELLED: &str = "Action cancelled. How else can I help you?";
const REASK: &str = "Please reply with 'yes' or 'no' to confirm or cancel.";

/// Where a conversation currently stands
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Idle,
    Collecting {
        intent: Intent,
        waiting_for: String,
    },
    AwaitingConfirmation {
        intent: Intent,
    },
}

/// How a turn ended, when it ended the dialog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DialogOutcome {
    Confirmed { intent: Intent },
    Cancelled,
}

/// Reply to one user turn
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DialogTurn {
    pub reply: String,
    pub state: DialogState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DialogOutcome>,
}

/// Per-session dialog driver
#[derive(Debug, Clone, Default)]
pub struct Dialog {
    state: DialogState,
}

impl Dialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = DialogState::Idle;
    }

    /// Advance the dialog with one user message
    pub fn handle(&mut self, input: &str) -> DialogTurn {
        let (reply, outcome) = match std::mem::take(&mut self.state) {
            DialogState::Idle => (self.start(input), None),
            DialogState::Collecting {
                mut intent,
                waiting_for,
            } => {
                if is_cancel(input) {
                    (CANCELLED.to_string(), Some(DialogOutcome::Cancelled))
                } else {
                    intent
                        .entities
                        .insert(waiting_for, input.trim().to_string());
                    (self.advance(intent), None)
                }
            }
            DialogState::AwaitingConfirmation { intent } => match confirmation(input) {
                Some(true) => {
                    tracing::info!(intent = %intent.kind, "Dialog confirmed");
                    (CONFIRMED.to_string(), Some(DialogOutcome::Confirmed { intent }))
                }
                Some(false) => (CANCELLED.to_string(), Some(DialogOutcome::Cancelled)),
                None => {
                    self.state = DialogState::AwaitingConfirmation { intent };
                    (REASK.to_string(), None)
                }
            },
        };

        DialogTurn {
            reply,
            state: self.state.clone(),
            outcome,
        }
    }

    fn start(&mut self, input: &str) -> String {
        match recognize_intent(input) {
            None => NOT_UNDERSTOOD.to_string(),
            Some(intent) if intent.kind.is_creation() => self.advance(intent),
            Some(intent) => describe(&intent),
        }
    }

    /// Ask for the next missing entity, or for confirmation
    fn advance(&mut self, intent: Intent) -> String {
        match intent.missing_entity() {
            Some(name) => {
                self.state = DialogState::Collecting {
                    intent,
                    waiting_for: name.to_string(),
                };
                parameter_prompt(name)
            }
            None => {
                let reply = format!("{} Confirm? (yes/no)", describe(&intent));
                self.state = DialogState::AwaitingConfirmation { intent };
                reply
            }
        }
    }
}

fn entity<'a>(intent: &'a Intent, key: &str) -> &'a str {
    intent.entities.get(key).map(String::as_str).unwrap_or("?")
}

/// One-line summary of what an intent will do
pub fn describe(intent: &Intent) -> String {
    match intent.kind {
        IntentKind::CreatePool => format!(
            "Creating liquidity pool for {} and {} with {}% APY.",
            entity(intent, "token1"),
            entity(intent, "token2"),
            entity(intent, "apy")
        ),
        IntentKind::CreateToken => format!(
            "Creating token named {} with supply {}.",
            entity(intent, "token_name"),
            entity(intent, "supply")
        ),
        IntentKind::CreateVault => format!(
            "Creating yield vault for {} with a {} strategy.",
            entity(intent, "token"),
            entity(intent, "strategy")
        ),
        IntentKind::JoinPool => format!("Joining pool with ID {}.", entity(intent, "pool_id")),
        IntentKind::QueryInfo => format!(
            "Querying info for {}: {}.",
            entity(intent, "entity_type"),
            entity(intent, "entity_id")
        ),
        IntentKind::GeneralHelp => {
            "Welcome to the Aptos Assistant DeFi Suite! How can I help you with DeFi today?"
                .to_string()
        }
    }
}

fn parameter_prompt(name: &str) -> String {
    match name {
        "token1" => "Please tell me the first token symbol (e.g., APT).".to_string(),
        "token2" => "Please tell me the second token symbol (e.g., USDC).".to_string(),
        "apy" => "What APY percentage would you like to set for the pool?".to_string(),
        "token_name" => "What is the name of the token you want to create?".to_string(),
        "supply" => "What is the total supply for this token?".to_string(),
        "token" => "Which token should the vault accept (e.g., APT)?".to_string(),
        "strategy" => "Which yield strategy should the vault use?".to_string(),
        other => format!("Please provide {}.", other),
    }
}

fn confirmation(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "yes" | "y" | "confirm" | "sure" => Some(true),
        "no" | "n" | "cancel" => Some(false),
        _ => None,
    }
}

fn is_cancel(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("cancel")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_then_confirm() {
        let mut dialog = Dialog::new();

        let turn = dialog.handle("I want to create token named Moon");
        assert_eq!(turn.reply, "What is the total supply for this token?");
        assert!(matches!(
            dialog.state(),
            DialogState::Collecting { waiting_for, .. } if waiting_for == "supply"
        ));

        let turn = dialog.handle(" 5000 ");
        assert_eq!(
            turn.reply,
            "Creating token named Moon with supply 5000. Confirm? (yes/no)"
        );

        let turn = dialog.handle("maybe");
        assert_eq!(turn.reply, REASK);
        assert!(matches!(turn.state, DialogState::AwaitingConfirmation { .. }));

        let turn = dialog.handle("Yes");
        assert_eq!(turn.reply, CONFIRMED);
        assert_eq!(turn.state, DialogState::Idle);
        match turn.outcome {
            Some(DialogOutcome::Confirmed { intent }) => {
                assert_eq!(intent.kind, IntentKind::CreateToken);
                assert_eq!(intent.entities["supply"], "5000");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_complete_intent_goes_straight_to_confirmation() {
        let mut dialog = Dialog::new();
        let turn = dialog.handle("Create a liquidity pool with APT and USDC at 7% APY");
        assert!(turn.reply.ends_with("Confirm? (yes/no)"));

        let turn = dialog.handle("no");
        assert_eq!(turn.outcome, Some(DialogOutcome::Cancelled));
        assert_eq!(dialog.state(), &DialogState::Idle);
    }

    #[test]
    fn test_cancel_while_collecting() {
        let mut dialog = Dialog::new();
        dialog.handle("create pool please");
        let turn = dialog.handle("cancel");
        assert_eq!(turn.reply, CANCELLED);
        assert_eq!(turn.state, DialogState::Idle);
    }

    #[test]
    fn test_simple_intents_stay_idle() {
        let mut dialog = Dialog::new();
        let turn = dialog.handle("Join pool 12345");
        assert_eq!(turn.reply, "Joining pool with ID 12345.");
        assert_eq!(turn.state, DialogState::Idle);

        let turn = dialog.handle("asdf");
        assert_eq!(turn.reply, NOT_UNDERSTOOD);
    }
}
