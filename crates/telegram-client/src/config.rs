//! Configuration types for telegram-client.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Default Bot API server.
pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Configuration for talking to the Bot API.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Base URL of the Bot API server.
    pub base_url: String,
    /// Bot token from @BotFather.
    pub token: SecretString,
    /// Long-polling timeout passed to `getUpdates`.
    pub poll_timeout: Duration,
}

impl BotConfig {
    /// Create a configuration for the public Bot API server.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: SecretString::from(token.into()),
            poll_timeout: Duration::from_secs(30),
        }
    }

    /// Use a different Bot API server (self-hosted or a test double).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the long-polling timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// URL of a Bot API method. Contains the token; never log it.
    pub fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url.trim_end_matches('/'),
            self.token.expose_secret(),
            method
        )
    }
}
