//! Client error taxonomy.

use std::time::Duration;

use talkwire_core::{DecodeError, Value};
use thiserror::Error;

/// Errors surfaced by the client.
///
/// Protocol-level failures are always returned or emitted as events, never
/// panicked. A `Connect` failure is fatal to that attempt only; the caller
/// may retry with a fresh client. `Timeout` evicts the abandoned call but
/// leaves the connection up.
#[derive(Debug, Error)]
pub enum ClientError {
    /// WebSocket handshake or dial failed, or the client was already
    /// connected.
    #[error("connect failed: {context}")]
    Connect {
        /// What went wrong.
        context: String,
    },

    /// The proxy configuration could not be used.
    #[error("invalid proxy: {context}")]
    Proxy {
        /// What was wrong with it.
        context: String,
    },

    /// The client is not connected (never connected, or closed).
    #[error("not connected")]
    NotConnected,

    /// A socket write failed mid-session.
    #[error("websocket write failed: {context}")]
    Write {
        /// The underlying write failure.
        context: String,
    },

    /// The server answered the call with an error payload, passed through
    /// verbatim.
    #[error("server error: {0}")]
    Remote(Value),

    /// No response arrived within the caller's window. The pending call is
    /// evicted; a late response is discarded silently.
    #[error("no response to {method} within {timeout:?}")]
    Timeout {
        /// The method that was called.
        method: String,
        /// The window that elapsed.
        timeout: Duration,
    },

    /// An inbound message could not be parsed as a frame.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
