//! Layered bot configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Compiled defaults ([`RobotConfig::default`])
//! 2. An optional JSON file
//! 3. `TALKWIRE_*` environment variables (`TALKWIRE_ACCESS_TOKEN`,
//!    `TALKWIRE_ENDPOINT`, `TALKWIRE_PROXY_URL`, `TALKWIRE_NAME`)

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};

use talkwire_client::DEFAULT_ENDPOINT;

use crate::errors::BotError;

/// Bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Bot name; `respond` listeners trigger on it.
    pub name: String,
    /// Access token used to create the session.
    pub access_token: Option<String>,
    /// WebSocket API endpoint.
    pub endpoint: String,
    /// Optional HTTP proxy for the WebSocket connection.
    pub proxy_url: Option<String>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: "talkwire".to_owned(),
            access_token: None,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            proxy_url: None,
        }
    }
}

impl RobotConfig {
    /// Load configuration from defaults and `TALKWIRE_*` environment
    /// variables.
    pub fn load() -> Result<Self, BotError> {
        Self::extract(Self::figment(None))
    }

    /// Load configuration from defaults, a JSON file, and `TALKWIRE_*`
    /// environment variables.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, BotError> {
        Self::extract(Self::figment(Some(path.as_ref())))
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Json::file(path));
        }
        figment.merge(Env::prefixed("TALKWIRE_"))
    }

    fn extract(figment: Figment) -> Result<Self, BotError> {
        figment.extract().map_err(|e| BotError::Config(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let config = RobotConfig::extract(RobotConfig::figment(None)).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.name, "talkwire");
        assert!(config.access_token.is_none());
    }

    #[test]
    fn json_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{"name": "greeter", "access_token": "tok-1", "endpoint": "wss://example.com/rpc"}}"#
        )
        .unwrap();

        let config = RobotConfig::load_from(&path).unwrap();
        assert_eq!(config.name, "greeter");
        assert_eq!(config.access_token.as_deref(), Some("tok-1"));
        assert_eq!(config.endpoint, "wss://example.com/rpc");
        assert!(config.proxy_url.is_none());
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            let path = jail.directory().join("bot.json");
            let _ = jail.create_file("bot.json", r#"{"name": "from-file"}"#)?;
            jail.set_env("TALKWIRE_NAME", "from-env");

            let config = RobotConfig::load_from(&path).expect("load");
            assert_eq!(config.name, "from-env");
            Ok(())
        });
    }
}
