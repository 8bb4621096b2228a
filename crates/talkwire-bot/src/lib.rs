//! # talkwire-bot
//!
//! A small hubot-style bot framework over [`talkwire_client`]: register
//! regex listeners, connect, and react to chat messages.
//!
//! ```ignore
//! let mut robot = Robot::new(RobotConfig::load()?)?;
//! robot.respond("ping", |reply| async move {
//!     let _ = reply.send("pong").await;
//! })?;
//! robot.hear("deploy (\\w+)", |reply| async move {
//!     let target = reply.captures[1].clone();
//!     let _ = reply.send(&format!("deploying {target}")).await;
//! })?;
//! robot.run().await?;
//! ```
//!
//! `respond` listeners fire only when the bot is addressed (`@name …` or
//! `name: …`); `hear` listeners see every message. Handlers run as
//! independent tasks, so a slow handler never blocks dispatch.

mod config;
mod errors;
mod robot;

pub use config::RobotConfig;
pub use errors::BotError;
pub use robot::{Reply, Robot};

pub use talkwire_client::{Client, events};
pub use talkwire_core::{IncomingMessage, MessageKind, Value};
