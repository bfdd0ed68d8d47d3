//! Environment-sourced configuration

use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3847;
pub const DEFAULT_DELAY_MS: u64 = 15_000;
pub const DEFAULT_CHANNEL: &str = "#agent-notifications";

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the hook server listens on.
    pub port: u16,
    /// Debounce delay before a pending notification escalates to chat.
    pub delay_ms: u64,
    /// Chat channel notifications are posted to.
    pub channel: String,
    /// Channel id replies are accepted from. Events carry ids, not names,
    /// so filtering needs this; unset means accept any channel.
    pub channel_id: Option<String>,
    /// Explicit multiplexer session; skips discovery when set.
    pub session_override: Option<String>,
    /// Chat platform bot token; only `serve` requires it.
    pub bot_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            delay_ms: DEFAULT_DELAY_MS,
            channel: DEFAULT_CHANNEL.to_string(),
            channel_id: None,
            session_override: None,
            bot_token: String::new(),
        }
    }
}

impl Config {
    /// Read configuration from the environment. Unparseable numeric
    /// values fall back to their defaults rather than erroring.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parsed("PORT", defaults.port),
            delay_ms: env_parsed("NOTIFICATION_DELAY", defaults.delay_ms),
            channel: env_nonempty("SLACK_CHANNEL").unwrap_or(defaults.channel),
            channel_id: env_nonempty("SLACK_CHANNEL_ID"),
            session_override: env_nonempty("TMUX_SESSION"),
            bot_token: env_nonempty("SLACK_BOT_TOKEN").unwrap_or_default(),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_nonempty(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3847);
        assert_eq!(config.delay_ms, 15_000);
        assert_eq!(config.channel, "#agent-notifications");
        assert!(config.channel_id.is_none());
        assert!(config.session_override.is_none());
    }

    #[test]
    fn test_delay_duration() {
        let config = Config {
            delay_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.delay(), Duration::from_millis(250));
    }
}
