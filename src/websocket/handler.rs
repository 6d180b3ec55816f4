//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and forwards store change events
//! to each connection according to its subscriptions.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::messages::{ClientMessage, ServerMessage, Subscriptions};
use crate::api::AppState;

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.store.subscribe();
    let mut subscriptions = Subscriptions::new();

    let connected = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    if send(&mut sender, &connected).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Failed to send connected message");
        return;
    }
    tracing::debug!(connection_id = %connection_id, "WebSocket connected");

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                        break;
                    }
                    None => break,
                };

                let Some(reply) = handle_message(&mut subscriptions, message) else {
                    break;
                };
                let mut open = true;
                for msg in reply {
                    if send(&mut sender, &msg).await.is_err() {
                        open = false;
                        break;
                    }
                }
                if !open {
                    break;
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) if subscriptions.matches(&event) => {
                        if send(&mut sender, &ServerMessage::StoreEvent { event }).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(connection_id = %connection_id, skipped, "WebSocket client lagging");
                        let msg = ServerMessage::Error {
                            message: format!("Missed {} store events", skipped),
                        };
                        if send(&mut sender, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(connection_id = %connection_id, "WebSocket disconnected");
}

async fn send(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(text) => sender.send(Message::Text(text)).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            Ok(())
        }
    }
}

/// Replies for one received frame; `None` closes the connection
fn handle_message(
    subscriptions: &mut Subscriptions,
    message: Message,
) -> Option<Vec<ServerMessage>> {
    let text = match message {
        Message::Text(text) => text,
        Message::Binary(_) => {
            return Some(vec![ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            }])
        }
        Message::Ping(_) | Message::Pong(_) => return Some(Vec::new()),
        Message::Close(_) => return None,
    };

    let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
        Ok(msg) => msg,
        Err(e) => {
            return Some(vec![ServerMessage::Error {
                message: format!("Invalid message format: {}", e),
            }])
        }
    };

    let replies = match client_msg {
        ClientMessage::Subscribe { topics } => {
            let (accepted, unknown) = subscriptions.subscribe(&topics);
            let mut replies = vec![ServerMessage::Subscribed { topics: accepted }];
            if !unknown.is_empty() {
                replies.push(ServerMessage::Error {
                    message: format!("Unknown topics: {}", unknown.join(", ")),
                });
            }
            replies
        }
        ClientMessage::Unsubscribe { topics } => vec![ServerMessage::Unsubscribed {
            topics: subscriptions.unsubscribe(&topics),
        }],
        ClientMessage::Ping => vec![ServerMessage::Pong],
    };
    Some(replies)
}
