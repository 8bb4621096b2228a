//! Helpers over the neutral [`rmpv::Value`] payload type.
//!
//! The wire encoding is free to pick any integer width for a given number,
//! and the server mixes string and integer representations for ids. Every
//! comparison or dispatch on a numeric field goes through the normalizers
//! here so the rest of the crate never pattern-matches on encoding widths.

use rmpv::Value;

/// Normalize any msgpack numeric encoding to `i64`.
///
/// Accepts all integer widths and fraction-carrying floats (truncated, as
/// the reference client does). Returns `None` for non-numeric values and
/// for unsigned values above `i64::MAX`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => n.as_i64(),
        Value::F32(f) => Some(*f as i64),
        Value::F64(f) => Some(*f as i64),
        _ => None,
    }
}

/// Normalize any msgpack numeric encoding to `u64`.
///
/// Negative values and non-numeric values return `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Integer(n) => n.as_u64(),
        Value::F32(f) if *f >= 0.0 => Some(*f as u64),
        Value::F64(f) if *f >= 0.0 => Some(*f as u64),
        _ => None,
    }
}

/// Look up a field in a msgpack map by string key.
#[must_use]
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .as_map()?
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

/// Coerce an id field to its canonical string form.
///
/// The server is inconsistent about id representations: some arrive as
/// strings, some as integers. Both normalize to the decimal string form;
/// anything else returns `None`.
#[must_use]
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => s.as_str().map(str::to_owned),
        Value::Integer(n) => n
            .as_u64()
            .map(|u| u.to_string())
            .or_else(|| n.as_i64().map(|i| i.to_string())),
        _ => None,
    }
}

/// Render a payload as JSON for structured logging.
///
/// Lossy by design: binary data is rendered as a lossy UTF-8 string and
/// extension types as their debug form. Never used on the wire.
#[must_use]
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Nil => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => n.as_i64().map_or_else(
            || {
                n.as_u64()
                    .map_or(serde_json::Value::Null, serde_json::Value::from)
            },
            serde_json::Value::from,
        ),
        Value::F32(f) => serde_json::Value::from(f64::from(*f)),
        Value::F64(f) => serde_json::Value::from(*f),
        Value::String(s) => {
            serde_json::Value::String(String::from_utf8_lossy(s.as_bytes()).into_owned())
        }
        Value::Binary(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| {
                    let key = k
                        .as_str()
                        .map_or_else(|| format!("{k}"), str::to_owned);
                    (key, to_json(v))
                })
                .collect(),
        ),
        Value::Ext(tag, data) => serde_json::Value::String(format!("ext({tag}, {data:?})")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
