//! The robot: listener registration and message dispatch.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;
use tokio::sync::mpsc;

use talkwire_client::{Client, Options, events};
use talkwire_core::message::SelectContent;
use talkwire_core::value::{field, id_string};
use talkwire_core::{IncomingMessage, MessageKind};

use crate::config::RobotConfig;
use crate::errors::BotError;

type ListenerHandler = Arc<dyn Fn(Reply) -> BoxFuture<'static, ()> + Send + Sync>;

/// A registered message listener.
struct Listener {
    pattern: Regex,
    /// Only fires when the message addresses the bot by name.
    direct_only: bool,
    handler: ListenerHandler,
}

/// Context handed to a listener when its pattern matches.
#[derive(Clone)]
pub struct Reply {
    /// The matched message.
    pub message: IncomingMessage,
    /// Capture groups of the match; index 0 is the whole match, missing
    /// groups are empty strings.
    pub captures: Vec<String>,
    client: Client,
}

impl Reply {
    /// Text of the matched message.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.message.text
    }

    /// Send a text message to the talk the message came from.
    pub async fn send(&self, text: &str) -> Result<(), BotError> {
        let _ = self.client.send_text(&self.message.talk_id, text).await?;
        Ok(())
    }

    /// Reply in the same talk, mentioning the sender.
    pub async fn reply(&self, text: &str) -> Result<(), BotError> {
        let mention = format!("@{} {text}", self.message.user_id);
        self.send(&mention).await
    }

    /// Post a multiple-choice poll to the same talk; returns the created
    /// message id when the server reports one.
    pub async fn send_select(
        &self,
        question: &str,
        options: Vec<String>,
    ) -> Result<Option<String>, BotError> {
        let content = SelectContent {
            question: question.to_owned(),
            options,
            listing: true,
            // All recipients must answer before the poll closes.
            closing_type: Some(1),
        };
        let result = self
            .client
            .send(&self.message.talk_id, MessageKind::Select, content.into_value())
            .await?;
        Ok(field(&result, "message_id").and_then(id_string))
    }

    /// The underlying client, for anything beyond canned replies.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// The bot: a client plus an ordered list of regex listeners.
pub struct Robot {
    name: String,
    client: Client,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for Robot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Robot")
            .field("name", &self.name)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Robot {
    /// Build a robot from configuration. Fails without an access token.
    pub fn new(config: RobotConfig) -> Result<Self, BotError> {
        let token = config.access_token.clone().ok_or(BotError::MissingToken)?;
        let mut options = Options::new()
            .with_endpoint(config.endpoint.as_str())
            .with_access_token(token)
            .with_name(config.name.as_str());
        if let Some(proxy) = &config.proxy_url {
            options = options.with_proxy_url(proxy.as_str());
        }
        Ok(Self {
            name: config.name,
            client: Client::new(options),
            listeners: Vec::new(),
        })
    }

    /// The bot's name, as used for addressing.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying client, e.g. for registering raw event handlers
    /// before [`Robot::run`].
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Listen to every message matching `pattern`.
    pub fn hear<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<(), BotError>
    where
        F: Fn(Reply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.add_listener(pattern, false, handler)
    }

    /// Listen to messages that address the bot (`@name …` or `name: …`)
    /// and match `pattern` after the address prefix is stripped.
    pub fn respond<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<(), BotError>
    where
        F: Fn(Reply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.add_listener(pattern, true, handler)
    }

    fn add_listener<F, Fut>(
        &mut self,
        pattern: &str,
        direct_only: bool,
        handler: F,
    ) -> Result<(), BotError>
    where
        F: Fn(Reply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.listeners.push(Listener {
            pattern: Regex::new(pattern)?,
            direct_only,
            handler: Arc::new(move |reply| handler(reply).boxed()),
        });
        Ok(())
    }

    /// Connect and dispatch messages until the connection dies or ctrl-c.
    pub async fn run(self) -> Result<(), BotError> {
        let mut messages = self.client.take_messages().ok_or(BotError::QueueTaken)?;

        let (error_tx, mut error_rx) = mpsc::unbounded_channel();
        self.client.on(events::ERROR, move |value| {
            let tx = error_tx.clone();
            async move {
                let _ = tx.send(value);
            }
        });
        self.client.on(events::DATA_RECOVERED, |_| async {
            tracing::info!("robot ready");
        });

        self.client.connect().await?;
        tracing::info!(name = %self.name, "robot connected");

        loop {
            tokio::select! {
                maybe = messages.recv() => match maybe {
                    Some(message) => self.dispatch(message),
                    None => break,
                },
                Some(error) = error_rx.recv() => {
                    tracing::warn!(error = %error, "connection lost");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutting down");
                    break;
                }
            }
        }

        self.client.close().await;
        Ok(())
    }

    /// Run one message through every listener. Each match spawns its
    /// handler as an independent task.
    fn dispatch(&self, message: IncomingMessage) {
        let text = message.text.trim();
        let stripped = strip_address(&self.name, text);

        for listener in &self.listeners {
            let candidate = if listener.direct_only {
                match stripped {
                    Some(rest) => rest,
                    None => continue,
                }
            } else {
                text
            };
            let Some(captures) = listener.pattern.captures(candidate) else {
                continue;
            };
            let captures: Vec<String> = captures
                .iter()
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
                .collect();
            let reply = Reply {
                message: message.clone(),
                captures,
                client: self.client.clone(),
            };
            let handler = Arc::clone(&listener.handler);
            drop(tokio::spawn(async move {
                handler(reply).await;
            }));
        }
    }
}

/// If `text` addresses the bot by name, return the remainder.
///
/// Accepted forms: `@name rest`, `name: rest`, `name, rest`, `name rest`.
fn strip_address<'a>(name: &str, text: &'a str) -> Option<&'a str> {
    let trimmed = text.trim_start();
    let without_at = trimmed.strip_prefix('@').unwrap_or(trimmed);
    let rest = without_at.strip_prefix(name)?;
    if !(rest.is_empty()
        || rest.starts_with([':', ','])
        || rest.starts_with(char::is_whitespace))
    {
        return None;
    }
    Some(rest.trim_start_matches([':', ',']).trim_start())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
