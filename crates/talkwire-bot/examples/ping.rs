//! Minimal bot: answers "ping" with "pong" when addressed.
//!
//! ```sh
//! TALKWIRE_ACCESS_TOKEN=... cargo run --example ping
//! ```

use anyhow::Result;
use talkwire_bot::{Robot, RobotConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut robot = Robot::new(RobotConfig::load()?)?;

    robot.respond("ping", |reply| async move {
        if let Err(e) = reply.send("pong").await {
            tracing::warn!(error = %e, "reply failed");
        }
    })?;

    robot.hear("lunch\\?", |reply| async move {
        let options = vec!["ramen".to_owned(), "curry".to_owned(), "sandwiches".to_owned()];
        if let Err(e) = reply.send_select("where to?", options).await {
            tracing::warn!(error = %e, "poll failed");
        }
    })?;

    robot.run().await?;
    Ok(())
}
