//! Message kinds, incoming message parsing, and outgoing content payloads.

use rmpv::Value;
use serde::Serialize;

use crate::value::{as_i64, field, id_string};

// ─────────────────────────────────────────────────────────────────────────────
// MessageKind
// ─────────────────────────────────────────────────────────────────────────────

/// The message type discriminator carried in message payloads.
///
/// Action-stamp kinds (13–21) are internal enum values used when
/// *receiving*. When *sending* an action stamp the server expects the
/// 500-series wire code instead; see [`MessageKind::send_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// System-generated message.
    System,
    /// Plain text.
    Text,
    /// Emoji stamp.
    Stamp,
    /// Shared location.
    Location,
    /// Single file attachment.
    File,
    /// Text with multiple file attachments.
    TextMultipleFile,
    /// Reserved by the protocol.
    Reserved,
    /// The original message was deleted.
    Deleted,
    /// A note was shared.
    NoteShared,
    /// A shared note was deleted.
    NoteDeleted,
    /// A note was created.
    NoteCreated,
    /// A shared note was updated.
    NoteUpdated,
    /// Legacy stamp type.
    OriginalStamp,
    /// Yes/no poll.
    YesNo,
    /// Yes/no poll response.
    YesNoReply,
    /// Multiple-choice poll.
    Select,
    /// Multiple-choice poll response.
    SelectReply,
    /// Task assignment.
    Task,
    /// Task completion.
    TaskDone,
    /// Yes/no poll closed.
    YesNoClosed,
    /// Multiple-choice poll closed.
    SelectClosed,
    /// Task closed.
    TaskClosed,
    /// A discriminator this client does not know.
    Unknown(i64),
}

/// Base of the wire codes used when sending action stamps.
const ACTION_STAMP_WIRE_BASE: i64 = 500;
/// First internal action-stamp discriminator.
const ACTION_STAMP_FIRST: i64 = 13;
/// Last internal action-stamp discriminator.
const ACTION_STAMP_LAST: i64 = 21;

impl MessageKind {
    /// Map a received discriminator to a kind.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::System,
            1 => Self::Text,
            2 => Self::Stamp,
            3 => Self::Location,
            4 => Self::File,
            5 => Self::TextMultipleFile,
            6 => Self::Reserved,
            7 => Self::Deleted,
            8 => Self::NoteShared,
            9 => Self::NoteDeleted,
            10 => Self::NoteCreated,
            11 => Self::NoteUpdated,
            12 => Self::OriginalStamp,
            13 => Self::YesNo,
            14 => Self::YesNoReply,
            15 => Self::Select,
            16 => Self::SelectReply,
            17 => Self::Task,
            18 => Self::TaskDone,
            19 => Self::YesNoClosed,
            20 => Self::SelectClosed,
            21 => Self::TaskClosed,
            other => Self::Unknown(other),
        }
    }

    /// The internal discriminator for this kind.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::System => 0,
            Self::Text => 1,
            Self::Stamp => 2,
            Self::Location => 3,
            Self::File => 4,
            Self::TextMultipleFile => 5,
            Self::Reserved => 6,
            Self::Deleted => 7,
            Self::NoteShared => 8,
            Self::NoteDeleted => 9,
            Self::NoteCreated => 10,
            Self::NoteUpdated => 11,
            Self::OriginalStamp => 12,
            Self::YesNo => 13,
            Self::YesNoReply => 14,
            Self::Select => 15,
            Self::SelectReply => 16,
            Self::Task => 17,
            Self::TaskDone => 18,
            Self::YesNoClosed => 19,
            Self::SelectClosed => 20,
            Self::TaskClosed => 21,
            Self::Unknown(code) => code,
        }
    }

    /// The discriminator to put on the wire when *sending* this kind.
    ///
    /// Action stamps translate to the 500-series
    /// (`500 + (internal - 13)`); everything else sends its internal code.
    #[must_use]
    pub fn send_code(self) -> i64 {
        let code = self.code();
        if (ACTION_STAMP_FIRST..=ACTION_STAMP_LAST).contains(&code) {
            ACTION_STAMP_WIRE_BASE + (code - ACTION_STAMP_FIRST)
        } else {
            code
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IncomingMessage
// ─────────────────────────────────────────────────────────────────────────────

/// A parsed `notify_create_message` payload.
///
/// Parsing is deliberately lenient: the server omits fields freely, and ids
/// arrive as strings or integers depending on the field and server version.
/// `domain_id` is often absent from the notification itself and gets filled
/// in by the client from its talk→organization cache.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Message id.
    pub id: String,
    /// Talk the message was posted to.
    pub talk_id: String,
    /// Author's user id.
    pub user_id: String,
    /// Organization the talk belongs to, when known.
    pub domain_id: Option<String>,
    /// Message type discriminator.
    pub kind: MessageKind,
    /// Text content for text-bearing kinds, empty otherwise.
    pub text: String,
    /// The structured content field, verbatim.
    pub content: Value,
    /// The full notification payload, verbatim.
    pub raw: Value,
}

impl IncomingMessage {
    /// Parse a notification payload into a message record.
    ///
    /// Returns `None` when the payload is not a map or carries no id —
    /// such payloads are dropped, not errors.
    #[must_use]
    pub fn parse(payload: &Value) -> Option<Self> {
        let _ = payload.as_map()?;

        let id = field(payload, "message_id")
            .or_else(|| field(payload, "id"))
            .and_then(id_string)?;
        let talk_id = field(payload, "talk_id")
            .and_then(id_string)
            .unwrap_or_default();
        let user_id = field(payload, "user_id")
            .and_then(id_string)
            .unwrap_or_default();
        let domain_id = field(payload, "domain_id").and_then(id_string);
        let kind = field(payload, "type")
            .and_then(as_i64)
            .map_or(MessageKind::Unknown(-1), MessageKind::from_code);

        let content = field(payload, "content").cloned().unwrap_or(Value::Nil);
        let text = match &content {
            Value::String(s) => s.as_str().unwrap_or_default().to_owned(),
            map @ Value::Map(_) => field(map, "text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            _ => String::new(),
        };

        Some(Self {
            id,
            talk_id,
            user_id,
            domain_id,
            kind,
            text,
            content,
            raw: payload.clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outgoing content payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Serialize an outgoing content struct into a wire payload value.
fn content_value<T: Serialize>(content: &T) -> Value {
    // Plain field structs cannot fail to serialize into a Value.
    rmpv::ext::to_value(content).expect("serialize message content")
}

/// Emoji stamp content.
#[derive(Debug, Clone, Serialize)]
pub struct StampContent {
    /// Stamp collection id.
    pub stamp_set: String,
    /// Stamp index within the collection.
    pub stamp_index: String,
    /// Optional accompanying text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl StampContent {
    /// Wire payload for this content.
    #[must_use]
    pub fn into_value(self) -> Value {
        content_value(&self)
    }
}

/// Yes/no poll content (sent with [`MessageKind::YesNo`]).
#[derive(Debug, Clone, Serialize)]
pub struct YesNoContent {
    /// The question text.
    pub question: String,
    /// Whether responses are listed to participants.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub listing: bool,
}

impl YesNoContent {
    /// Wire payload for this content.
    #[must_use]
    pub fn into_value(self) -> Value {
        content_value(&self)
    }
}

/// Multiple-choice poll content (sent with [`MessageKind::Select`]).
#[derive(Debug, Clone, Serialize)]
pub struct SelectContent {
    /// The question text.
    pub question: String,
    /// Selectable options.
    pub options: Vec<String>,
    /// Whether selections are listed to participants.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub listing: bool,
    /// How the poll closes (1 = all participants must answer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_type: Option<i64>,
}

impl SelectContent {
    /// Wire payload for this content.
    #[must_use]
    pub fn into_value(self) -> Value {
        content_value(&self)
    }
}

/// Task assignment content (sent with [`MessageKind::Task`]).
#[derive(Debug, Clone, Serialize)]
pub struct TaskContent {
    /// Task description.
    pub title: String,
    /// How the task closes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_type: Option<i64>,
}

impl TaskContent {
    /// Wire payload for this content.
    #[must_use]
    pub fn into_value(self) -> Value {
        content_value(&self)
    }
}

/// Location share content.
#[derive(Debug, Clone, Serialize)]
pub struct LocationContent {
    /// Human-readable address.
    pub address: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

impl LocationContent {
    /// Wire payload for this content.
    #[must_use]
    pub fn into_value(self) -> Value {
        content_value(&self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
