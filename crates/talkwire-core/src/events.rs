//! Event names exposed to subscribers.
//!
//! Two families share the subscription table: client lifecycle events
//! emitted locally, and server notification names delivered verbatim as
//! the method field of inbound request frames.

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// WebSocket connection established (before any session exists).
pub const CONNECTED: &str = "connected";
/// Session successfully created after connect.
pub const SESSION_CREATED: &str = "session_created";
/// Session creation failed (bad or expired token).
pub const SESSION_ERROR: &str = "session_error";
/// Initial data sync complete; notifications are flowing.
pub const DATA_RECOVERED: &str = "data_recovered";
/// The notification subsystem reported an error during bootstrap.
pub const NOTIFICATION_ERROR: &str = "notification_error";
/// Connection or protocol failure; the connection is closed.
pub const ERROR: &str = "error";
/// An inbound message could not be decoded; the connection stays up.
pub const DECODE_ERROR: &str = "decode_error";

// ─── Message notifications ───────────────────────────────────────────────────

/// A new message was posted to a talk.
pub const NOTIFY_CREATE_MESSAGE: &str = "notify_create_message";
/// A message was deleted.
pub const NOTIFY_DELETE_MESSAGE: &str = "notify_delete_message";

// ─── Talk notifications ──────────────────────────────────────────────────────

/// A group talk was created.
pub const NOTIFY_CREATE_GROUP_TALK: &str = "notify_create_group_talk";
/// A pair (1:1) talk was created.
pub const NOTIFY_CREATE_PAIR_TALK: &str = "notify_create_pair_talk";
/// Users were added to a group talk.
pub const NOTIFY_ADD_TALKERS: &str = "notify_add_talkers";
/// A user was removed from a talk.
pub const NOTIFY_DELETE_TALKER: &str = "notify_delete_talker";
/// Talk settings changed.
pub const NOTIFY_UPDATE_TALK: &str = "notify_update_talk";

// ─── User notifications ──────────────────────────────────────────────────────

/// A friend was added.
pub const NOTIFY_ADD_FRIEND: &str = "notify_add_friend";
/// A friend was removed.
pub const NOTIFY_DELETE_FRIEND: &str = "notify_delete_friend";
/// An acquaintance was added.
pub const NOTIFY_ADD_ACQUAINTANCE: &str = "notify_add_acquaintance";
/// Multiple acquaintances were added.
pub const NOTIFY_ADD_ACQUAINTANCES: &str = "notify_add_acquaintances";
/// User profile data changed.
pub const NOTIFY_UPDATE_USER: &str = "notify_update_user";

// ─── Organization notifications ──────────────────────────────────────────────

/// The user joined an organization.
pub const NOTIFY_JOIN_DOMAIN: &str = "notify_join_domain";
/// The user left an organization.
pub const NOTIFY_LEAVE_DOMAIN: &str = "notify_leave_domain";
/// An organization invitation arrived.
pub const NOTIFY_ADD_DOMAIN_INVITE: &str = "notify_add_domain_invite";
/// An organization invitation was withdrawn.
pub const NOTIFY_DELETE_DOMAIN_INVITE: &str = "notify_delete_domain_invite";

// ─── Content notifications ───────────────────────────────────────────────────

/// A file attachment was created.
pub const NOTIFY_CREATE_ATTACHMENT: &str = "notify_create_attachment";
/// A file attachment was deleted.
pub const NOTIFY_DELETE_ATTACHMENT: &str = "notify_delete_attachment";
/// A note was created.
pub const NOTIFY_CREATE_NOTE: &str = "notify_create_note";
/// A note was updated.
pub const NOTIFY_UPDATE_NOTE: &str = "notify_update_note";
/// A note was deleted.
pub const NOTIFY_DELETE_NOTE: &str = "notify_delete_note";
/// A talk was added to favorites.
pub const NOTIFY_ADD_FAVORITE_TALK: &str = "notify_add_favorite_talk";
/// A talk was removed from favorites.
pub const NOTIFY_DELETE_FAVORITE_TALK: &str = "notify_delete_favorite_talk";
/// An announcement was posted.
pub const NOTIFY_CREATE_ANNOUNCEMENT: &str = "notify_create_announcement";
/// An announcement was deleted.
pub const NOTIFY_DELETE_ANNOUNCEMENT: &str = "notify_delete_announcement";

// ─── Status notifications ────────────────────────────────────────────────────

/// Message read status changed.
pub const NOTIFY_UPDATE_READ_STATUS: &str = "notify_update_read_status";
/// Talk status changed (unread count, latest message).
pub const NOTIFY_UPDATE_TALK_STATUS: &str = "notify_update_talk_status";

// ─── Conference notifications ────────────────────────────────────────────────

/// A conference call started.
pub const NOTIFY_CREATE_CONFERENCE: &str = "notify_create_conference";
/// A conference call ended.
pub const NOTIFY_CLOSE_CONFERENCE: &str = "notify_close_conference";
/// A participant joined a conference.
pub const NOTIFY_CONFERENCE_JOIN: &str = "notify_conference_participant_join";
/// A participant rejected a conference invitation.
pub const NOTIFY_CONFERENCE_REJECT: &str = "notify_conference_participant_reject";
