//! RPC method names accepted by the server.

// ─── Session ─────────────────────────────────────────────────────────────────

/// Authenticate with an access token and open the session.
pub const CREATE_SESSION: &str = "create_session";
/// Ask the server to begin delivering notifications.
pub const START_NOTIFICATION: &str = "start_notification";
/// Reset server-side notification state after a failed start.
pub const RESET_NOTIFICATION: &str = "reset_notification";
/// Mark the session as recently used.
pub const UPDATE_LAST_USED_AT: &str = "update_last_used_at";

// ─── Users ───────────────────────────────────────────────────────────────────

/// Fetch the authenticated user's profile.
pub const GET_ME: &str = "get_me";
/// Fetch specific users by id.
pub const GET_USERS: &str = "get_users";
/// Fetch a user's extended profile.
pub const GET_PROFILE: &str = "get_profile";
/// Fetch online/offline presence for users.
pub const GET_PRESENCES: &str = "get_presences";

// ─── Friends ─────────────────────────────────────────────────────────────────

/// Add a user to the friends list.
pub const ADD_FRIEND: &str = "add_friend";
/// Remove a user from the friends list.
pub const DELETE_FRIEND: &str = "delete_friend";
/// Fetch the friends list.
pub const GET_FRIENDS: &str = "get_friends";
/// Fetch acquaintances (users sharing a talk).
pub const GET_ACQUAINTANCES: &str = "get_acquaintances";

// ─── Organizations ───────────────────────────────────────────────────────────

/// Fetch the organizations the user belongs to.
pub const GET_DOMAINS: &str = "get_domains";
/// Leave an organization.
pub const LEAVE_DOMAIN: &str = "leave_domain";
/// Fetch pending organization invitations.
pub const GET_DOMAIN_INVITES: &str = "get_domain_invites";
/// Accept an organization invitation.
pub const ACCEPT_DOMAIN_INVITE: &str = "accept_domain_invite";
/// Decline an organization invitation.
pub const DELETE_DOMAIN_INVITE: &str = "delete_domain_invite";
/// Fetch the members of an organization.
pub const GET_DOMAIN_USERS: &str = "get_domain_users";

// ─── Talks ───────────────────────────────────────────────────────────────────

/// Fetch the talk list.
pub const GET_TALKS: &str = "get_talks";
/// Fetch per-talk status (unread counts, latest message).
pub const GET_TALK_STATUSES: &str = "get_talk_statuses";
/// Create a group talk.
pub const CREATE_GROUP_TALK: &str = "create_group_talk";
/// Create a pair (1:1) talk.
pub const CREATE_PAIR_TALK: &str = "create_pair_talk";
/// Update group talk settings.
pub const UPDATE_GROUP_TALK: &str = "update_group_talk";
/// Add users to a group talk.
pub const ADD_TALKERS: &str = "add_talkers";
/// Remove a user from a talk.
pub const DELETE_TALKER: &str = "delete_talker";
/// Add a talk to favorites.
pub const ADD_FAVORITE_TALK: &str = "add_favorite_talk";
/// Remove a talk from favorites.
pub const DELETE_FAVORITE_TALK: &str = "delete_favorite_talk";

// ─── Messages ────────────────────────────────────────────────────────────────

/// Fetch messages from a talk.
pub const GET_MESSAGES: &str = "get_messages";
/// Post a message to a talk.
pub const CREATE_MESSAGE: &str = "create_message";
/// Delete a message.
pub const DELETE_MESSAGE: &str = "delete_message";
/// Search messages across talks.
pub const SEARCH_MESSAGES: &str = "search_messages";
/// Fetch favorite messages.
pub const GET_FAVORITE_MESSAGES: &str = "get_favorite_messages";
/// Mark a message as favorite.
pub const ADD_FAVORITE_MESSAGE: &str = "add_favorite_message";
/// Unmark a favorite message.
pub const DELETE_FAVORITE_MESSAGE: &str = "delete_favorite_message";

// ─── Announcements ───────────────────────────────────────────────────────────

/// Post an announcement.
pub const CREATE_ANNOUNCEMENT: &str = "create_announcement";
/// Fetch announcements.
pub const GET_ANNOUNCEMENTS: &str = "get_announcements";
/// Fetch announcement read statuses.
pub const GET_ANNOUNCEMENT_STATUSES: &str = "get_announcement_statuses";

// ─── Conferences ─────────────────────────────────────────────────────────────

/// Fetch active conference calls.
pub const GET_CONFERENCES: &str = "get_conferences";
/// Join a conference call.
pub const JOIN_CONFERENCE: &str = "join_conference";
/// Leave a conference call.
pub const LEAVE_CONFERENCE: &str = "leave_conference";
/// Reject a conference invitation.
pub const REJECT_CONFERENCE: &str = "reject_conference";
