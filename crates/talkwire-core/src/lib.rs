//! # talkwire-core
//!
//! Wire protocol and shared vocabulary for the talkwire chat RPC client.
//!
//! The talkwire service speaks a MessagePack RPC dialect over a single
//! WebSocket connection. Every wire message is a 4-element msgpack array:
//!
//! - Request: `[0, id, method, params]` — sent by the client to invoke a
//!   method, and by the server to push a notification.
//! - Response: `[1, id, error, result]` — the reply to a request, matched
//!   by `id`.
//!
//! This crate provides:
//!
//! - **Frames**: [`Frame`] with msgpack encode/decode and the mandatory
//!   notification acknowledgment shape
//! - **Value helpers**: numeric-width normalization and map access over
//!   [`rmpv::Value`], the serialization-neutral payload type
//! - **Vocabulary**: event and RPC method name constants
//! - **Messages**: [`MessageKind`] discriminators, [`IncomingMessage`]
//!   parsing, and outgoing content payload builders
//! - **Records**: typed views over user / organization / talk payloads

pub mod errors;
pub mod events;
pub mod frame;
pub mod message;
pub mod methods;
pub mod records;
pub mod value;

pub use errors::DecodeError;
pub use frame::{Frame, RPC_REQUEST, RPC_RESPONSE};
pub use message::{IncomingMessage, MessageKind};
pub use records::{Domain, Talk, TalkStatus, User};

/// The neutral payload type carried by every frame field.
pub use rmpv::Value;

/// Protocol version reported during session creation.
pub const API_VERSION: &str = "1.128";
