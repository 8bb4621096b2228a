//! Bot errors.

use talkwire_client::ClientError;
use thiserror::Error;

/// Errors surfaced by the bot framework.
#[derive(Debug, Error)]
pub enum BotError {
    /// No access token in the configuration; the bot cannot authenticate.
    #[error("no access token configured (set TALKWIRE_ACCESS_TOKEN)")]
    MissingToken,

    /// A listener pattern did not compile.
    #[error("invalid listener pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The underlying client failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The message queue receiver was taken out of the client before
    /// `run` could claim it.
    #[error("message queue already taken")]
    QueueTaken,
}
