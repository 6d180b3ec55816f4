//! Conversation layer
//!
//! - **intent**: Classify a message and pull out entities (symbols, rates, names)
//! - **dialog**: Per-session state machine that gathers missing entities and
//!   asks for confirmation before an action runs

pub mod dialog;
pub mod intent;

pub use dialog::{describe, Dialog, DialogOutcome, DialogState, DialogTurn};
pub use intent::{recognize_intent, Entities, Intent, IntentKind};
