//! The RPC wire frame.
//!
//! Every message on the socket is a msgpack array of exactly four elements.
//! Two kinds share the shape:
//!
//! - `[0, id, method, params]` — a request. Sent client→server to invoke a
//!   method; sent server→client to push a notification (by convention with
//!   id 0, though routing never relies on that).
//! - `[1, id, error, result]` — a response. `error` is nil on success.
//!
//! Every inbound request frame must be answered with `[1, id, nil, true]`
//! regardless of whether anything handled it; [`Frame::ack`] builds that
//! acknowledgment.

use rmpv::Value;

use crate::errors::DecodeError;
use crate::value::as_u64;

/// Wire kind for request frames.
pub const RPC_REQUEST: u64 = 0;

/// Wire kind for response frames.
pub const RPC_RESPONSE: u64 = 1;

/// One 4-element wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A method invocation or server notification: `[0, id, method, params]`.
    Request {
        /// Correlation identifier. Client-allocated ids start at 1;
        /// server notifications use 0 by convention.
        id: u64,
        /// Method or notification name.
        method: String,
        /// Positional parameters.
        params: Vec<Value>,
    },
    /// The reply to a request: `[1, id, error, result]`.
    Response {
        /// Identifier of the request being answered.
        id: u64,
        /// Error payload, `Nil` on success.
        error: Value,
        /// Result payload, `Nil` on failure.
        result: Value,
    },
}

impl Frame {
    /// Build a request frame.
    #[must_use]
    pub fn request(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self::Request {
            id,
            method: method.into(),
            params,
        }
    }

    /// Build the mandatory acknowledgment for an inbound request frame:
    /// `[1, id, nil, true]`.
    #[must_use]
    pub fn ack(id: u64) -> Self {
        Self::Response {
            id,
            error: Value::Nil,
            result: Value::Boolean(true),
        }
    }

    /// The correlation identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::Request { id, .. } | Self::Response { id, .. } => *id,
        }
    }

    /// Encode to msgpack bytes, ready to send as one binary message.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let value = match self {
            Self::Request { id, method, params } => Value::Array(vec![
                Value::from(RPC_REQUEST),
                Value::from(*id),
                Value::from(method.as_str()),
                Value::Array(params.clone()),
            ]),
            Self::Response { id, error, result } => Value::Array(vec![
                Value::from(RPC_RESPONSE),
                Value::from(*id),
                error.clone(),
                result.clone(),
            ]),
        };
        let mut buf = Vec::new();
        // Writing msgpack into a Vec cannot fail.
        rmpv::encode::write_value(&mut buf, &value).expect("encode into Vec");
        buf
    }

    /// Decode one binary message into a frame.
    ///
    /// Extra trailing array elements are tolerated; the kind and id fields
    /// accept any numeric width.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = bytes;
        let value = rmpv::decode::read_value(&mut reader)?;

        let Value::Array(items) = value else {
            return Err(DecodeError::NotAnArray);
        };
        if items.len() < 4 {
            return Err(DecodeError::TooShort { len: items.len() });
        }

        let kind = as_u64(&items[0]).ok_or(DecodeError::BadKind)?;
        let id = as_u64(&items[1]).ok_or(DecodeError::BadId)?;

        match kind {
            RPC_REQUEST => {
                let method = items[2]
                    .as_str()
                    .ok_or(DecodeError::BadMethod)?
                    .to_owned();
                let Value::Array(params) = items[3].clone() else {
                    return Err(DecodeError::BadParams);
                };
                Ok(Self::Request { id, method, params })
            }
            RPC_RESPONSE => Ok(Self::Response {
                id,
                error: items[2].clone(),
                result: items[3].clone(),
            }),
            other => Err(DecodeError::UnknownKind {
                kind: i64::try_from(other).unwrap_or(i64::MAX),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
