//! Client configuration.

use url::Url;

/// Default WebSocket endpoint for the talkwire service.
pub const DEFAULT_ENDPOINT: &str = "wss://api.talkwire.io/rpc";

/// Configuration for a [`Client`](crate::Client).
///
/// ```ignore
/// let options = Options::new()
///     .with_access_token(std::env::var("TALKWIRE_TOKEN")?)
///     .with_name("greeter");
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// WebSocket API endpoint.
    pub endpoint: String,
    /// Access token. When present, the client creates a session and runs
    /// the initialization sequence automatically after connecting.
    pub access_token: Option<String>,
    /// Optional HTTP proxy (`http://proxy.example.com:8080`) the WebSocket
    /// connection is tunneled through.
    pub proxy_url: Option<String>,
    /// Client name, used only in log output.
    pub name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            access_token: None,
            proxy_url: None,
            name: "talkwire".to_owned(),
        }
    }
}

impl Options {
    /// Options pointing at the default endpoint, with no credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the access token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the HTTP proxy URL.
    #[must_use]
    pub fn with_proxy_url(mut self, proxy: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy.into());
        self
    }

    /// Set the client name used in logs.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The API host, derived from the endpoint.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.endpoint)
            .ok()?
            .host_str()
            .map(str::to_owned)
    }
}
