//! Decode errors for inbound wire frames.

use thiserror::Error;

/// A received message could not be parsed as a valid RPC frame.
///
/// Decode failures are tolerated as noise: the read loop reports them and
/// keeps going, so each variant carries enough context to be useful in a
/// log line.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes were not valid MessagePack.
    #[error("invalid msgpack: {0}")]
    Msgpack(#[from] rmpv::decode::Error),

    /// The root value was not an array.
    #[error("frame root is not an array")]
    NotAnArray,

    /// The array had fewer than the required 4 elements.
    #[error("frame too short: {len} elements")]
    TooShort {
        /// Number of elements received.
        len: usize,
    },

    /// The first element was not an integer frame kind.
    #[error("frame kind is not an integer")]
    BadKind,

    /// The frame kind was neither request (0) nor response (1).
    #[error("unknown frame kind {kind}")]
    UnknownKind {
        /// The kind value received.
        kind: i64,
    },

    /// The identifier field was not an integer.
    #[error("frame id is not an integer")]
    BadId,

    /// A request frame's method field was not a string.
    #[error("method is not a string")]
    BadMethod,

    /// A request frame's params field was not an array.
    #[error("params is not an array")]
    BadParams,
}
