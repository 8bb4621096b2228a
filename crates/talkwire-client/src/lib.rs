//! # talkwire-client
//!
//! RPC client for the talkwire chat service: one WebSocket connection
//! carrying MessagePack-encoded request/response frames, with server-pushed
//! notifications sharing the request wire shape.
//!
//! Two pieces make up the core:
//!
//! - **Transport** owns the socket: serialized writes, the read loop, and
//!   the 45-second protocol-level ping heartbeat.
//! - **Dispatcher** owns correlation state: it assigns request ids, tracks
//!   pending calls, completes them when responses arrive, fans out
//!   notifications to subscribers, and acknowledges every inbound request
//!   frame with `[1, id, nil, true]`.
//!
//! [`Client`] ties them together and adds the session bootstrap sequence,
//! typed convenience wrappers, and a bounded queue of parsed incoming
//! messages.
//!
//! ```ignore
//! let client = Client::new(Options::new().with_access_token(token));
//! client.on(events::SESSION_CREATED, |v| async move {
//!     tracing::info!(?v, "session up");
//! });
//! let mut messages = client.take_messages().expect("first take");
//! client.connect().await?;
//! while let Some(msg) = messages.recv().await {
//!     client.send_text(&msg.talk_id, "pong").await?;
//! }
//! ```

mod api;
mod client;
mod dispatcher;
mod errors;
mod options;
mod proxy;
mod transport;

pub use client::Client;
pub use errors::ClientError;
pub use options::{DEFAULT_ENDPOINT, Options};

pub use talkwire_core::{events, methods, IncomingMessage, MessageKind, Value};
