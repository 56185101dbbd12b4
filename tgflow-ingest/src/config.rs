//! Ingestion settings, loaded from environment variables (call `dotenvy::dotenv()` first).
//! Values are validated once and read-only afterwards.

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use tgflow_core::mask_token;
use tgflow_dispatch::MatchStrategy;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_POLL_LIMIT: u8 = 100;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CHANNEL_CAPACITY: usize = 1;
const DEFAULT_WEBHOOK_MAX_CONNECTIONS: u8 = 40;

/// `setWebhook` parameters. The HTTPS listener itself is not part of this crate.
#[derive(Clone, Default)]
pub struct WebhookConfig {
    /// WEBHOOK_URL
    pub url: String,
    /// WEBHOOK_MAX_CONNECTIONS (1..=100)
    pub max_connections: u8,
    /// WEBHOOK_SECRET_TOKEN, echoed by the server in `X-Telegram-Bot-Api-Secret-Token`
    pub secret_token: Option<String>,
    /// WEBHOOK_IP_ADDRESS
    pub ip_address: Option<String>,
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .field("max_connections", &self.max_connections)
            .field("secret_token", &self.secret_token.as_ref().map(|_| "***"))
            .field("ip_address", &self.ip_address)
            .finish()
    }
}

#[derive(Clone)]
pub struct BotConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL
    pub api_url: String,
    /// POLL_INTERVAL_MS: sleep before each retrieval
    pub poll_interval: Duration,
    /// POLL_LIMIT: max updates per batch (1..=100)
    pub poll_limit: u8,
    /// POLL_TIMEOUT_SECS: server-side long-poll timeout
    pub poll_timeout_secs: u64,
    /// ALLOWED_UPDATES: comma separated; empty means server default
    pub allowed_updates: Vec<String>,
    /// CHANNEL_CAPACITY: buffer of each fan-out stream (>= 1)
    pub channel_capacity: usize,
    /// MATCH_STRATEGY: tree | linear
    pub match_strategy: MatchStrategy,
    /// Present when WEBHOOK_URL is set
    pub webhook: Option<WebhookConfig>,
    /// LOG_FILE
    pub log_file: Option<String>,
}

impl BotConfig {
    /// Defaults for everything except the token.
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_limit: DEFAULT_POLL_LIMIT,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            allowed_updates: Vec::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            match_strategy: MatchStrategy::default(),
            webhook: None,
            log_file: None,
        }
    }

    /// Loads from environment variables. `token` overrides BOT_TOKEN if provided.
    /// Call [`BotConfig::validate`] afterwards.
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let mut config = Self::with_token(bot_token);

        if let Ok(url) = env::var("TELEGRAM_API_URL") {
            config.api_url = url;
        }
        if let Some(ms) = parse_var::<u64>("POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(limit) = parse_var("POLL_LIMIT")? {
            config.poll_limit = limit;
        }
        if let Some(secs) = parse_var("POLL_TIMEOUT_SECS")? {
            config.poll_timeout_secs = secs;
        }
        if let Ok(list) = env::var("ALLOWED_UPDATES") {
            config.allowed_updates = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(capacity) = parse_var("CHANNEL_CAPACITY")? {
            config.channel_capacity = capacity;
        }
        if let Ok(strategy) = env::var("MATCH_STRATEGY") {
            config.match_strategy = strategy
                .parse()
                .map_err(|e: String| anyhow::anyhow!("MATCH_STRATEGY: {}", e))?;
        }
        if let Ok(url) = env::var("WEBHOOK_URL") {
            config.webhook = Some(WebhookConfig {
                url,
                max_connections: parse_var("WEBHOOK_MAX_CONNECTIONS")?
                    .unwrap_or(DEFAULT_WEBHOOK_MAX_CONNECTIONS),
                secret_token: env::var("WEBHOOK_SECRET_TOKEN").ok(),
                ip_address: env::var("WEBHOOK_IP_ADDRESS").ok(),
            });
        }
        config.log_file = env::var("LOG_FILE").ok();

        Ok(config)
    }

    /// Checks URLs and numeric ranges.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if reqwest::Url::parse(&self.api_url).is_err() {
            anyhow::bail!("TELEGRAM_API_URL is not a valid URL: {}", self.api_url);
        }
        if !(1..=100).contains(&self.poll_limit) {
            anyhow::bail!("POLL_LIMIT must be between 1 and 100, got {}", self.poll_limit);
        }
        if self.channel_capacity == 0 {
            anyhow::bail!("CHANNEL_CAPACITY must be at least 1");
        }
        if let Some(webhook) = &self.webhook {
            let url = reqwest::Url::parse(&webhook.url)
                .with_context(|| format!("WEBHOOK_URL is not a valid URL: {}", webhook.url))?;
            if url.scheme() != "https" {
                anyhow::bail!("WEBHOOK_URL must use https, got {}", url.scheme());
            }
            if !(1..=100).contains(&webhook.max_connections) {
                anyhow::bail!(
                    "WEBHOOK_MAX_CONNECTIONS must be between 1 and 100, got {}",
                    webhook.max_connections
                );
            }
        }
        Ok(())
    }

    /// HTTP timeout for gateway calls: long-poll timeout plus slack for the round trip.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs + 10)
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &mask_token(&self.bot_token))
            .field("api_url", &self.api_url)
            .field("poll_interval", &self.poll_interval)
            .field("poll_limit", &self.poll_limit)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("allowed_updates", &self.allowed_updates)
            .field("channel_capacity", &self.channel_capacity)
            .field("match_strategy", &self.match_strategy)
            .field("webhook", &self.webhook)
            .field("log_file", &self.log_file)
            .finish()
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BOT_TOKEN",
        "TELEGRAM_API_URL",
        "POLL_INTERVAL_MS",
        "POLL_LIMIT",
        "POLL_TIMEOUT_SECS",
        "ALLOWED_UPDATES",
        "CHANNEL_CAPACITY",
        "MATCH_STRATEGY",
        "WEBHOOK_URL",
        "WEBHOOK_MAX_CONNECTIONS",
        "WEBHOOK_SECRET_TOKEN",
        "WEBHOOK_IP_ADDRESS",
        "LOG_FILE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_with_token() {
        let config = BotConfig::with_token("test_token");
        assert_eq!(config.bot_token, "test_token");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.poll_limit, 100);
        assert_eq!(config.channel_capacity, 1);
        assert!(config.webhook.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        env::set_var("BOT_TOKEN", "env_token");

        let config = BotConfig::from_env(None).unwrap();

        assert_eq!(config.bot_token, "env_token");
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.poll_timeout_secs, 30);
        assert!(config.allowed_updates.is_empty());
        assert_eq!(config.match_strategy, MatchStrategy::Tree);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_custom_values() {
        clear_env();
        env::set_var("BOT_TOKEN", "env_token");
        env::set_var("POLL_INTERVAL_MS", "250");
        env::set_var("POLL_LIMIT", "50");
        env::set_var("ALLOWED_UPDATES", "message, callback_query,,poll");
        env::set_var("MATCH_STRATEGY", "linear");
        env::set_var("WEBHOOK_URL", "https://bot.example.com/hook");
        env::set_var("WEBHOOK_SECRET_TOKEN", "s3cret");

        let config = BotConfig::from_env(Some("override_token".to_string())).unwrap();

        assert_eq!(config.bot_token, "override_token");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.poll_limit, 50);
        assert_eq!(config.allowed_updates, vec!["message", "callback_query", "poll"]);
        assert_eq!(config.match_strategy, MatchStrategy::Linear);
        let webhook = config.webhook.as_ref().unwrap();
        assert_eq!(webhook.max_connections, 40);
        assert_eq!(webhook.secret_token.as_deref(), Some("s3cret"));
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token() {
        clear_env();
        assert!(BotConfig::from_env(None).is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage_number() {
        clear_env();
        env::set_var("BOT_TOKEN", "t");
        env::set_var("POLL_LIMIT", "lots");
        assert!(BotConfig::from_env(None).is_err());
        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = BotConfig::with_token("t");
        config.api_url = "not-a-valid-url".to_string();
        assert!(config.validate().is_err());

        let mut config = BotConfig::with_token("t");
        config.poll_limit = 0;
        assert!(config.validate().is_err());

        let mut config = BotConfig::with_token("t");
        config.webhook = Some(WebhookConfig {
            url: "http://insecure.example.com".to_string(),
            max_connections: 40,
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_masks_token() {
        let config = BotConfig::with_token("123456789:AAEhBOweik6ad9r_QXMENQjcrGbqCr4K-ug");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("AAEhBOweik6ad9r"));
        assert!(printed.contains("1234567***K-ug"));
    }
}
