//! WebSocket Message Types
//!
//! Client and server message formats for the store change stream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::store::{StoreEvent, StoreTopic};

/// Topic name that matches every store topic
pub const ALL_TOPICS: &str = "*";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to store topics (e.g. "tokens", "simulations", "*")
    Subscribe { topics: Vec<String> },
    /// Unsubscribe from store topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected { connection_id: String },
    /// Topics now subscribed to
    Subscribed { topics: Vec<String> },
    /// Topics no longer subscribed to
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// A store mutation on a subscribed topic
    StoreEvent { event: StoreEvent },
    /// Error message
    Error { message: String },
}

/// Per-connection topic filter
#[derive(Debug, Default)]
pub struct Subscriptions {
    topics: BTreeSet<StoreTopic>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add topics; returns the accepted names and the unknown ones
    pub fn subscribe(&mut self, names: &[String]) -> (Vec<String>, Vec<String>) {
        let (topics, unknown) = resolve(names);
        let accepted = topics
            .into_iter()
            .inspect(|t| {
                self.topics.insert(*t);
            })
            .map(|t| t.to_string())
            .collect();
        (accepted, unknown)
    }

    /// Remove topics; returns the names that were removed
    pub fn unsubscribe(&mut self, names: &[String]) -> Vec<String> {
        let (topics, _) = resolve(names);
        topics
            .into_iter()
            .filter(|t| self.topics.remove(t))
            .map(|t| t.to_string())
            .collect()
    }

    pub fn matches(&self, event: &StoreEvent) -> bool {
        self.topics.contains(&event.topic)
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

fn resolve(names: &[String]) -> (Vec<StoreTopic>, Vec<String>) {
    let mut topics = Vec::new();
    let mut unknown = Vec::new();

    for name in names {
        if name == ALL_TOPICS {
            topics.extend_from_slice(StoreTopic::all());
            continue;
        }
        match StoreTopic::all().iter().find(|t| t.as_str() == name) {
            Some(topic) => topics.push(*topic),
            None => unknown.push(name.clone()),
        }
    }

    topics.sort();
    topics.dedup();
    (topics, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChangeKind;

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "topics": ["tokens", "pools"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => assert_eq!(topics, vec!["tokens", "pools"]),
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_store_event_message_shape() {
        let msg = ServerMessage::StoreEvent {
            event: StoreEvent::new(StoreTopic::Tokens, ChangeKind::Added, Some("token_1".into())),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "store_event");
        assert_eq!(json["event"]["topic"], "tokens");
        assert_eq!(json["event"]["kind"], "added");
        assert_eq!(json["event"]["id"], "token_1");
    }

    #[test]
    fn test_subscriptions_filter() {
        let mut subs = Subscriptions::new();
        let (accepted, unknown) = subs.subscribe(&["tokens".to_string(), "metrics".to_string()]);
        assert_eq!(accepted, vec!["tokens"]);
        assert_eq!(unknown, vec!["metrics"]);

        let token_event = StoreEvent::new(StoreTopic::Tokens, ChangeKind::Added, None);
        let chat_event = StoreEvent::new(StoreTopic::Chat, ChangeKind::Updated, None);
        assert!(subs.matches(&token_event));
        assert!(!subs.matches(&chat_event));

        assert_eq!(subs.unsubscribe(&["tokens".to_string()]), vec!["tokens"]);
        assert!(subs.is_empty());
    }

    #[test]
    fn test_wildcard_subscribes_everything() {
        let mut subs = Subscriptions::new();
        let (accepted, _) = subs.subscribe(&[ALL_TOPICS.to_string()]);
        assert_eq!(accepted.len(), StoreTopic::all().len());
        assert!(subs.matches(&StoreEvent::new(StoreTopic::Simulations, ChangeKind::Removed, None)));
    }
}
