//! Typed convenience wrappers over [`Client::call`].
//!
//! These are mechanical: marshal parameters, invoke the generic call path,
//! decode the neutral payload into records. Methods with stable result
//! shapes get typed returns; the rest hand back the raw [`Value`].

use rmpv::Value;

use talkwire_core::records::{Domain, Talk, TalkStatus, User, parse_list};
use talkwire_core::{MessageKind, methods};

use crate::client::Client;
use crate::errors::ClientError;

/// Room ids are numeric server-side but commonly handled as strings;
/// numeric strings go on the wire as integers, like the reference client.
fn talk_id_value(talk_id: &str) -> Value {
    talk_id
        .parse::<u64>()
        .map_or_else(|_| Value::from(talk_id), Value::from)
}

impl Client {
    // ─── Users ───────────────────────────────────────────────────────────

    /// Fetch the authenticated user's profile.
    pub async fn get_me(&self) -> Result<Option<User>, ClientError> {
        let result = self.call(methods::GET_ME, vec![]).await?;
        Ok(User::from_value(&result))
    }

    /// Fetch users by id.
    pub async fn get_users(&self, user_ids: &[&str]) -> Result<Vec<User>, ClientError> {
        let ids = Value::Array(user_ids.iter().map(|id| talk_id_value(id)).collect());
        let result = self.call(methods::GET_USERS, vec![ids]).await?;
        Ok(parse_list(&result, User::from_value))
    }

    /// Fetch the friends list.
    pub async fn get_friends(&self) -> Result<Value, ClientError> {
        self.call(methods::GET_FRIENDS, vec![]).await
    }

    /// Add a user to the friends list.
    pub async fn add_friend(&self, user_id: &str) -> Result<Value, ClientError> {
        self.call(methods::ADD_FRIEND, vec![talk_id_value(user_id)])
            .await
    }

    /// Fetch acquaintances (users sharing a talk with you).
    pub async fn get_acquaintances(&self) -> Result<Value, ClientError> {
        self.call(methods::GET_ACQUAINTANCES, vec![]).await
    }

    // ─── Organizations ───────────────────────────────────────────────────

    /// Fetch the organizations the user belongs to.
    pub async fn get_domains(&self) -> Result<Vec<Domain>, ClientError> {
        let result = self.call(methods::GET_DOMAINS, vec![]).await?;
        Ok(parse_list(&result, Domain::from_value))
    }

    /// Fetch pending organization invitations.
    pub async fn get_domain_invites(&self) -> Result<Value, ClientError> {
        self.call(methods::GET_DOMAIN_INVITES, vec![]).await
    }

    /// Accept an organization invitation.
    pub async fn accept_domain_invite(&self, invite_id: &str) -> Result<Value, ClientError> {
        self.call(
            methods::ACCEPT_DOMAIN_INVITE,
            vec![talk_id_value(invite_id)],
        )
        .await
    }

    // ─── Talks ───────────────────────────────────────────────────────────

    /// Fetch the talk list. Also refreshes the talk→organization cache used
    /// to enrich incoming messages.
    pub async fn get_talks(&self) -> Result<Vec<Talk>, ClientError> {
        let result = self.call(methods::GET_TALKS, vec![]).await?;
        let talks = parse_list(&result, Talk::from_value);
        self.inner().cache_talk_domains(&talks);
        Ok(talks)
    }

    /// Fetch per-talk status: unread counts and latest message ids.
    pub async fn get_talk_statuses(&self) -> Result<Vec<TalkStatus>, ClientError> {
        let result = self.call(methods::GET_TALK_STATUSES, vec![]).await?;
        Ok(parse_list(&result, TalkStatus::from_value))
    }

    /// Create a 1:1 talk with a user.
    pub async fn create_pair_talk(&self, user_id: &str) -> Result<Value, ClientError> {
        self.call(methods::CREATE_PAIR_TALK, vec![talk_id_value(user_id)])
            .await
    }

    /// Create a group talk.
    pub async fn create_group_talk(
        &self,
        name: &str,
        user_ids: &[&str],
    ) -> Result<Value, ClientError> {
        let ids = Value::Array(user_ids.iter().map(|id| talk_id_value(id)).collect());
        self.call(methods::CREATE_GROUP_TALK, vec![Value::from(name), ids])
            .await
    }

    /// Add users to a group talk.
    pub async fn add_talkers(&self, talk_id: &str, user_ids: &[&str]) -> Result<Value, ClientError> {
        let ids = Value::Array(user_ids.iter().map(|id| talk_id_value(id)).collect());
        self.call(methods::ADD_TALKERS, vec![talk_id_value(talk_id), ids])
            .await
    }

    // ─── Messages ────────────────────────────────────────────────────────

    /// Fetch up to `count` recent messages from a talk.
    pub async fn get_messages(&self, talk_id: &str, count: u64) -> Result<Value, ClientError> {
        self.call(
            methods::GET_MESSAGES,
            vec![talk_id_value(talk_id), Value::from(count)],
        )
        .await
    }

    /// Delete a message.
    pub async fn delete_message(&self, message_id: &str) -> Result<Value, ClientError> {
        self.call(methods::DELETE_MESSAGE, vec![talk_id_value(message_id)])
            .await
    }

    /// Post a message with an explicit kind and content payload.
    ///
    /// Action-stamp kinds are translated to their wire codes automatically;
    /// see [`MessageKind::send_code`].
    pub async fn send(
        &self,
        talk_id: &str,
        kind: MessageKind,
        content: Value,
    ) -> Result<Value, ClientError> {
        self.call(
            methods::CREATE_MESSAGE,
            vec![
                talk_id_value(talk_id),
                Value::from(kind.send_code()),
                content,
            ],
        )
        .await
    }

    /// Post a plain text message.
    pub async fn send_text(&self, talk_id: &str, text: &str) -> Result<Value, ClientError> {
        self.send(talk_id, MessageKind::Text, Value::from(text))
            .await
    }

    // ─── Announcements ───────────────────────────────────────────────────

    /// Fetch announcements for an organization.
    pub async fn get_announcements(&self, domain_id: &str) -> Result<Value, ClientError> {
        self.call(methods::GET_ANNOUNCEMENTS, vec![talk_id_value(domain_id)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_go_on_the_wire_as_integers() {
        assert_eq!(talk_id_value("123456"), Value::from(123_456u64));
        assert_eq!(talk_id_value("room-1"), Value::from("room-1"));
        assert_eq!(talk_id_value(""), Value::from(""));
    }
}
