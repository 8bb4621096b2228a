//! Typed views over server payloads.
//!
//! The server's maps carry more fields than these records keep; parsing is
//! lenient and unrecognized fields are simply ignored. Fields the server
//! sometimes sends under alternate keys (`id` vs `domain_id`, `name` vs
//! `domain_name`) accept either.

use rmpv::Value;

use crate::value::{as_i64, field, id_string};

/// A user profile.
#[derive(Debug, Clone, Default)]
pub struct User {
    /// User id.
    pub id: String,
    /// Account name.
    pub name: String,
    /// Display name shown in talks.
    pub display_name: String,
    /// Contact email, when visible.
    pub email: String,
    /// Avatar URL.
    pub icon_url: String,
    /// Whether this user accepts new talks.
    pub can_talk: bool,
}

impl User {
    /// Parse a user payload.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let _ = value.as_map()?;
        Some(Self {
            id: field(value, "id").and_then(id_string)?,
            name: string_field(value, "name"),
            display_name: string_field(value, "display_name"),
            email: string_field(value, "email"),
            icon_url: string_field(value, "icon_url"),
            can_talk: field(value, "can_talk").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

/// An organization the user belongs to.
#[derive(Debug, Clone, Default)]
pub struct Domain {
    /// Organization id.
    pub id: String,
    /// Organization name.
    pub name: String,
    /// Whether the organization is closed.
    pub closed: bool,
}

impl Domain {
    /// Parse an organization payload.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let _ = value.as_map()?;
        let id = field(value, "domain_id")
            .or_else(|| field(value, "id"))
            .and_then(id_string)?;
        let name = field(value, "domain_name")
            .and_then(Value::as_str)
            .or_else(|| field(value, "name").and_then(Value::as_str))
            .unwrap_or_default()
            .to_owned();
        Some(Self {
            id,
            name,
            closed: field(value, "closed").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

/// Talk room kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalkKind {
    /// 1:1 conversation.
    Pair,
    /// Group conversation.
    Group,
    /// A kind this client does not know.
    Unknown(i64),
}

impl TalkKind {
    fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Pair,
            2 => Self::Group,
            other => Self::Unknown(other),
        }
    }
}

/// A conversation room.
#[derive(Debug, Clone)]
pub struct Talk {
    /// Talk id.
    pub id: String,
    /// Organization the talk belongs to.
    pub domain_id: String,
    /// Pair or group.
    pub kind: TalkKind,
    /// Room name (empty for pair talks).
    pub name: String,
    /// Participant user ids.
    pub user_ids: Vec<String>,
}

impl Talk {
    /// Parse a talk payload.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let _ = value.as_map()?;
        Some(Self {
            id: field(value, "talk_id")
                .or_else(|| field(value, "id"))
                .and_then(id_string)?,
            domain_id: field(value, "domain_id").and_then(id_string).unwrap_or_default(),
            kind: field(value, "type")
                .and_then(as_i64)
                .map_or(TalkKind::Unknown(-1), TalkKind::from_code),
            name: string_field(value, "name"),
            user_ids: field(value, "user_ids")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(id_string).collect())
                .unwrap_or_default(),
        })
    }
}

/// Per-talk status: unread count and latest message.
#[derive(Debug, Clone, Default)]
pub struct TalkStatus {
    /// Talk id.
    pub talk_id: String,
    /// Unread message count.
    pub unread_count: i64,
    /// Latest message id, when present.
    pub latest_message_id: Option<String>,
}

impl TalkStatus {
    /// Parse a talk status payload.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let _ = value.as_map()?;
        Some(Self {
            talk_id: field(value, "talk_id").and_then(id_string)?,
            unread_count: field(value, "unread_count").and_then(as_i64).unwrap_or(0),
            latest_message_id: field(value, "latest_message_id")
                .or_else(|| field(value, "latest_msg_id"))
                .and_then(id_string),
        })
    }
}

fn string_field(value: &Value, key: &str) -> String {
    field(value, key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Parse every well-formed element of an array payload, skipping the rest.
pub fn parse_list<T>(value: &Value, parse: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(parse).collect())
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::from(k), v))
                .collect(),
        )
    }

    #[test]
    fn user_parses_with_missing_fields() {
        let user = User::from_value(&map(vec![
            ("id", Value::from(5u64)),
            ("display_name", Value::from("Dana")),
        ]))
        .unwrap();
        assert_eq!(user.id, "5");
        assert_eq!(user.display_name, "Dana");
        assert_eq!(user.name, "");
        assert!(!user.can_talk);
    }

    #[test]
    fn user_requires_id() {
        assert!(User::from_value(&map(vec![("name", Value::from("x"))])).is_none());
        assert!(User::from_value(&Value::Nil).is_none());
    }

    #[test]
    fn domain_accepts_alternate_keys() {
        let a = Domain::from_value(&map(vec![
            ("id", Value::from("d1")),
            ("name", Value::from("Acme")),
        ]))
        .unwrap();
        let b = Domain::from_value(&map(vec![
            ("domain_id", Value::from("d1")),
            ("domain_name", Value::from("Acme")),
        ]))
        .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, b.name);
    }

    #[test]
    fn talk_parses_participants() {
        let talk = Talk::from_value(&map(vec![
            ("id", Value::from("t1")),
            ("domain_id", Value::from("d1")),
            ("type", Value::from(2u64)),
            ("name", Value::from("general")),
            (
                "user_ids",
                Value::Array(vec![Value::from(1u64), Value::from("2")]),
            ),
        ]))
        .unwrap();
        assert_eq!(talk.kind, TalkKind::Group);
        assert_eq!(talk.user_ids, vec!["1".to_owned(), "2".to_owned()]);
    }

    #[test]
    fn talk_status_accepts_legacy_key() {
        let status = TalkStatus::from_value(&map(vec![
            ("talk_id", Value::from("t1")),
            ("unread_count", Value::from(3u64)),
            ("latest_msg_id", Value::from(99u64)),
        ]))
        .unwrap();
        assert_eq!(status.unread_count, 3);
        assert_eq!(status.latest_message_id.as_deref(), Some("99"));
    }

    #[test]
    fn parse_list_skips_malformed_entries() {
        let payload = Value::Array(vec![
            map(vec![("id", Value::from("u1"))]),
            Value::from("junk"),
            map(vec![("id", Value::from("u2"))]),
        ]);
        let users = parse_list(&payload, User::from_value);
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].id, "u2");
    }

    #[test]
    fn parse_list_of_non_array_is_empty() {
        assert!(parse_list(&Value::Nil, User::from_value).is_empty());
    }
}
