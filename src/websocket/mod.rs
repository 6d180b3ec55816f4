//! WebSocket Store Stream
//!
//! Pushes store change events to connected clients.
//!
//! Clients connect to `/api/v1/ws` and subscribe to store topics:
//! `user`, `wallet`, `chat`, `tokens`, `pools`, `vaults`, `simulations`,
//! or `*` for all of them.
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8090/api/v1/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['tokens', 'simulations']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'store_event') refresh(msg.event.topic);
//! };
//! ```

mod handler;
mod messages;

pub use handler::websocket_handler;
pub use messages::{ClientMessage, ServerMessage, Subscriptions, ALL_TOPICS};
