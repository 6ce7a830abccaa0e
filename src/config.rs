//! Configuration — loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// When to record a candidate post in the dedup store relative to the
/// delivery attempt.
///
/// `BeforeSend` (default) writes intent first: a crash between reserve and
/// send loses the item, but the item can never be double-posted. `AfterSend`
/// inverts the trade-off. For a broadcast channel, duplicates are worse than
/// silent drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOrder {
    BeforeSend,
    AfterSend,
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Source thread feed URL (JSON document).
    pub thread_url: String,
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Target channel, e.g. `@mychannel` or `-1001234567890`.
    pub channel_id: String,
    /// Path of the local dedup database file.
    pub db_path: PathBuf,
    /// Fixed sweep interval (jitter is added on top).
    pub check_interval: Duration,
    /// Pacing delay enforced after every sink call.
    pub send_delay: Duration,
    /// Timeout for feed and attachment fetches.
    pub fetch_timeout: Duration,
    /// Timeout for each sink call (media uploads can be slow).
    pub send_timeout: Duration,
    /// Maximum delivery attempts per unit before abandoning.
    pub max_attempts: u32,
    /// Reserve-before-send vs send-before-reserve.
    pub reserve_order: ReserveOrder,
    /// Port for the liveness probe.
    pub health_port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            thread_url: String::new(),
            bot_token: String::new(),
            channel_id: String::new(),
            db_path: PathBuf::from("./data/thread-relay.db"),
            check_interval: Duration::from_secs(60),
            send_delay: Duration::from_millis(1500),
            fetch_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(30),
            max_attempts: 3,
            reserve_order: ReserveOrder::BeforeSend,
            health_port: 8080,
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bot_token = require_env("TELEGRAM_BOT_TOKEN")?;
        let channel_id = require_env("TELEGRAM_CHANNEL_ID")?;
        let thread_url = require_env("RELAY_THREAD_URL")?;

        let db_path = std::env::var("RELAY_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let check_interval = env_secs("RELAY_CHECK_INTERVAL_SECS", defaults.check_interval)?;
        let send_delay = env_millis("RELAY_SEND_DELAY_MS", defaults.send_delay)?;
        let fetch_timeout = env_secs("RELAY_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?;
        let send_timeout = env_secs("RELAY_SEND_TIMEOUT_SECS", defaults.send_timeout)?;
        let max_attempts = env_parse("RELAY_MAX_ATTEMPTS", defaults.max_attempts)?;
        let health_port = env_parse("RELAY_HEALTH_PORT", defaults.health_port)?;

        let reserve_order = match std::env::var("RELAY_RESERVE_ORDER") {
            Ok(v) => parse_reserve_order(&v)?,
            Err(_) => defaults.reserve_order,
        };

        Ok(Self {
            thread_url,
            bot_token,
            channel_id,
            db_path,
            check_interval,
            send_delay,
            fetch_timeout,
            send_timeout,
            max_attempts,
            reserve_order,
            health_port,
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse {v:?}"),
        }),
        Err(_) => Ok(default),
    }
}

fn env_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(env_parse(key, default.as_secs())?))
}

fn env_millis(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    Ok(Duration::from_millis(env_parse(
        key,
        default.as_millis() as u64,
    )?))
}

fn parse_reserve_order(value: &str) -> Result<ReserveOrder, ConfigError> {
    match value {
        "before-send" => Ok(ReserveOrder::BeforeSend),
        "after-send" => Ok(ReserveOrder::AfterSend),
        other => Err(ConfigError::InvalidValue {
            key: "RELAY_RESERVE_ORDER".to_string(),
            message: format!("expected 'before-send' or 'after-send', got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_daemon() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.check_interval, Duration::from_secs(60));
        assert_eq!(cfg.send_delay, Duration::from_millis(1500));
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.reserve_order, ReserveOrder::BeforeSend);
    }

    #[test]
    fn reserve_order_parses_both_variants() {
        assert_eq!(
            parse_reserve_order("before-send").unwrap(),
            ReserveOrder::BeforeSend
        );
        assert_eq!(
            parse_reserve_order("after-send").unwrap(),
            ReserveOrder::AfterSend
        );
        assert!(parse_reserve_order("sometimes").is_err());
    }
}
