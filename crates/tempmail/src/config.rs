//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

/// Domain used when `TEMPMAIL_DOMAIN` is unset.
pub const DEFAULT_DOMAIN: &str = "1398hnjfkdskd.de";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Domain of generated addresses.
    pub domain: String,
    /// SMTP bind address.
    pub smtp_addr: SocketAddr,
    /// Host name announced in the SMTP greeting.
    pub smtp_hostname: String,
    /// HTTP bind address.
    pub http_addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Bot token; the bot is disabled without one.
    pub telegram_token: Option<SecretString>,
    /// Bot API base URL.
    pub telegram_api_url: String,
    /// Lifetime of stored mail and anonymous mailboxes; `None` keeps them forever.
    pub mailbox_ttl: Option<Duration>,
    /// Whether the HTTP server runs.
    pub web_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TEMPMAIL_DOMAIN` | Domain of generated addresses | `1398hnjfkdskd.de` |
    /// | `SMTP_ADDR` | SMTP bind address | `0.0.0.0:25` |
    /// | `SMTP_HOSTNAME` | Host name in the SMTP greeting | the domain |
    /// | `HTTP_ADDR` | HTTP bind address | `0.0.0.0:8000` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:tempmail.db?mode=rwc` |
    /// | `TELEGRAM_BOT_TOKEN` | Bot token | (bot disabled) |
    /// | `TELEGRAM_API_URL` | Bot API base URL | `https://api.telegram.org` |
    /// | `MAILBOX_TTL_HOURS` | Retention in hours, `0` keeps everything | `24` |
    /// | `WEB_ENABLED` | Serve the web inbox | `true` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let domain = var("TEMPMAIL_DOMAIN")
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string())
            .to_lowercase();
        if domain.contains('@') || domain.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                var: "TEMPMAIL_DOMAIN",
                value: domain,
            });
        }

        let smtp_addr = parse_addr("SMTP_ADDR", var("SMTP_ADDR"), "0.0.0.0:25")?;
        let http_addr = parse_addr("HTTP_ADDR", var("HTTP_ADDR"), "0.0.0.0:8000")?;
        let smtp_hostname = var("SMTP_HOSTNAME").unwrap_or_else(|| domain.clone());

        let database_url =
            var("SQLITE_PATH").unwrap_or_else(|| "sqlite:tempmail.db?mode=rwc".to_string());

        let telegram_token = var("TELEGRAM_BOT_TOKEN").map(SecretString::from);
        let telegram_api_url = var("TELEGRAM_API_URL")
            .unwrap_or_else(|| telegram_client::config::DEFAULT_BASE_URL.to_string());

        let mailbox_ttl = match var("MAILBOX_TTL_HOURS") {
            None => Some(Duration::from_secs(24 * 3600)),
            Some(value) => match value.parse::<u64>().ok().map(|h| h.checked_mul(3600)) {
                Some(Some(0)) => None,
                Some(Some(secs)) => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "MAILBOX_TTL_HOURS",
                        value,
                    })
                }
            },
        };

        let web_enabled = match var("WEB_ENABLED") {
            None => true,
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                var: "WEB_ENABLED",
                value,
            })?,
        };

        Ok(Self {
            domain,
            smtp_addr,
            smtp_hostname,
            http_addr,
            database_url,
            telegram_token,
            telegram_api_url,
            mailbox_ttl,
            web_enabled,
        })
    }
}

fn parse_addr(
    var: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<SocketAddr, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var} value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.domain, DEFAULT_DOMAIN);
        assert_eq!(config.smtp_hostname, DEFAULT_DOMAIN);
        assert_eq!(config.smtp_addr.port(), 25);
        assert_eq!(config.http_addr.port(), 8000);
        assert_eq!(config.database_url, "sqlite:tempmail.db?mode=rwc");
        assert!(config.telegram_token.is_none());
        assert_eq!(config.telegram_api_url, "https://api.telegram.org");
        assert_eq!(config.mailbox_ttl, Some(Duration::from_secs(86_400)));
        assert!(config.web_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("TEMPMAIL_DOMAIN", "Mail.Example.ORG"),
            ("SMTP_ADDR", "127.0.0.1:2525"),
            ("TELEGRAM_BOT_TOKEN", " 1:abc "),
            ("MAILBOX_TTL_HOURS", "0"),
            ("WEB_ENABLED", "off"),
        ])
        .unwrap();

        assert_eq!(config.domain, "mail.example.org");
        assert_eq!(config.smtp_hostname, "mail.example.org");
        assert_eq!(config.smtp_addr.port(), 2525);
        assert_eq!(
            config.telegram_token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("1:abc".to_string())
        );
        assert_eq!(config.mailbox_ttl, None);
        assert!(!config.web_enabled);
    }

    #[test]
    fn test_empty_token_disables_bot() {
        let config = load(&[("TELEGRAM_BOT_TOKEN", "")]).unwrap();
        assert!(config.telegram_token.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for (var, value) in [
            ("SMTP_ADDR", "localhost"),
            ("MAILBOX_TTL_HOURS", "soon"),
            ("MAILBOX_TTL_HOURS", "18446744073709551615"),
            ("WEB_ENABLED", "maybe"),
            ("TEMPMAIL_DOMAIN", "a@b.c"),
        ] {
            match load(&[(var, value)]) {
                Err(ConfigError::Invalid { var: reported, .. }) => assert_eq!(reported, var),
                Ok(_) => panic!("{} = {} was accepted", var, value),
            }
        }
    }
}
